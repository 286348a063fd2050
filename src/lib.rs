//! Parse layer of the shell.
//!
//! This crate exposes a minimal API so fuzz targets and unit tests can link
//! the tokenizer and pipeline planner without pulling in interactive deps.

mod error;
mod parse;

pub use error::{ErrorKind, ShellError, ShellResult};
pub use parse::{plan_pipeline, tokenize_line, ParsedLine, MAX_ARGS, MAX_LINE, SEG_END};

/// Fuzz helper for parser-only targets.
pub fn fuzz_parse_bytes(data: &[u8]) {
    let input = String::from_utf8_lossy(data);
    if let Ok(parsed) = tokenize_line(&input) {
        assert!(!parsed.args.is_empty());
        if parsed.has_pipe() {
            let plan = plan_pipeline(&parsed.seps);
            assert_eq!(plan.last(), Some(&SEG_END));
            for &offset in &plan[..plan.len() - 1] {
                assert!((offset as usize) < parsed.args.len());
            }
        }
    }
}
