//! Line source for the read loop.
//!
//! Yields one line per cycle, newline stripped: rustyline with in-session
//! recall when stdin is a terminal, plain reads otherwise so the binary
//! stays scriptable.

use std::env;
use std::io;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};

pub struct LineSource {
    editor: Editor<(), DefaultHistory>,
    interactive: bool,
}

impl LineSource {
    pub fn new() -> io::Result<Self> {
        let interactive = unsafe { libc::isatty(libc::STDIN_FILENO) == 1 };
        let edit_mode = match env::var("ROSH_EDITMODE").ok().as_deref() {
            Some("vi") | Some("VI") => EditMode::Vi,
            _ => EditMode::Emacs,
        };
        let config = Config::builder()
            .auto_add_history(true)
            .edit_mode(edit_mode)
            .build();
        let editor = Editor::with_config(config).map_err(io::Error::other)?;
        Ok(Self {
            editor,
            interactive,
        })
    }

    pub fn interactive(&self) -> bool {
        self.interactive
    }

    /// Next input line, or `None` on end of input. Ctrl-C yields an empty
    /// line so the loop just prompts again.
    pub fn next_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.interactive {
            match self.editor.readline(prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
                Err(ReadlineError::Eof) => Ok(None),
                Err(err) => Err(io::Error::other(err)),
            }
        } else {
            let mut line = String::new();
            let bytes = io::stdin().read_line(&mut line)?;
            if bytes == 0 {
                return Ok(None);
            }
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Ok(Some(line))
        }
    }
}
