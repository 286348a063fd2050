//! Tokenizer for shell input.
//!
//! One pass over whitespace-separated tokens. Operators are the exact
//! standalone tokens `<`, `>`, `|`, `&` — no quoting and no prefix matching,
//! so `>>` or `&&` are ordinary arguments.

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::{ParsedLine, MAX_ARGS, MAX_LINE, SEG_END};

pub fn tokenize_line(input: &str) -> ShellResult<ParsedLine> {
    if input.len() > MAX_LINE {
        return Err(ShellError::new(
            ErrorKind::Parse,
            "command line capacity exceeded",
        ));
    }

    let mut args: Vec<String> = Vec::new();
    let mut seps: Vec<isize> = Vec::new();
    let mut infile = None;
    let mut outfile = None;
    let mut background = false;
    // Offset where the stage currently being collected starts.
    let mut stage_start = 0usize;
    // Redirect operator still waiting for its path token.
    let mut pending_redirect: Option<char> = None;

    for token in input.split_whitespace() {
        if let Some(op) = pending_redirect.take() {
            // The token after a redirect operator is always its path.
            if op == '<' {
                infile = Some(token.to_string());
            } else {
                outfile = Some(token.to_string());
            }
            continue;
        }
        match token {
            "&" => background = true,
            "<" => {
                if !seps.is_empty() {
                    return Err(ShellError::new(
                        ErrorKind::Parse,
                        "input redirection must be on the first stage",
                    ));
                }
                pending_redirect = Some('<');
            }
            ">" => pending_redirect = Some('>'),
            "|" => {
                if outfile.is_some() {
                    return Err(ShellError::new(
                        ErrorKind::Parse,
                        "output redirection must be on the last stage",
                    ));
                }
                if args.len() == stage_start {
                    return Err(ShellError::new(
                        ErrorKind::Parse,
                        "empty command in pipeline",
                    ));
                }
                seps.push((args.len() - stage_start) as isize);
                stage_start = args.len();
            }
            _ => {
                if args.len() == MAX_ARGS {
                    return Err(ShellError::new(
                        ErrorKind::Parse,
                        "argument capacity exceeded",
                    ));
                }
                args.push(token.to_string());
            }
        }
    }

    if pending_redirect.is_some() {
        return Err(
            ShellError::new(ErrorKind::Parse, "empty file descriptor")
                .with_context("expected a path after < or >"),
        );
    }
    if args.len() == stage_start {
        let message = if seps.is_empty() {
            "empty command"
        } else {
            "trailing pipe"
        };
        return Err(ShellError::new(ErrorKind::Parse, message));
    }
    seps.push(SEG_END);

    Ok(ParsedLine {
        args,
        infile,
        outfile,
        seps,
        background,
    })
}
