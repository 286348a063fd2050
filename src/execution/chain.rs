//! Sibling pipeline orchestrator.
//!
//! All inter-stage pipes are created before any stage is forked, so every
//! sibling inherits a stable descriptor set regardless of its position;
//! creating each pipe just before its own fork would leave earlier siblings
//! blind to later pipes' write ends. The forking process closes every pipe
//! end once the last sibling is up, then waits for all of them.

use std::fs::File;
use std::os::fd::{AsRawFd, OwnedFd};
use std::process;

use log::debug;
use nix::unistd::{dup2, fork, pipe, ForkResult, Pid};

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::execution::{exec_stage, wait_for_child};
use crate::parse::SEG_END;

/// Runs the stages as N siblings of the current process and returns the
/// last (rightmost-typed) stage's exit status. The chain consumes the
/// tokenizer's forward-ordered deltas directly; no planning pass applies.
pub(crate) fn run_chain(
    args: &[String],
    seps: &[isize],
    fd_in: Option<&File>,
    fd_out: Option<&File>,
) -> ShellResult<i32> {
    let starts = stage_starts(seps);
    let count = starts.len();

    let mut pipes: Vec<(OwnedFd, OwnedFd)> = Vec::with_capacity(count - 1);
    for _ in 1..count {
        match pipe() {
            Ok(ends) => pipes.push(ends),
            Err(err) => {
                eprintln!("Pipe Failed");
                return Err(ShellError::new(
                    ErrorKind::Resource,
                    format!("pipe: {err}"),
                ));
            }
        }
    }

    let mut children: Vec<Pid> = Vec::with_capacity(count);
    let mut fork_error = None;
    for idx in 0..count {
        match unsafe { fork() } {
            Ok(ForkResult::Parent { child }) => children.push(child),
            Ok(ForkResult::Child) => {
                wire_stage(idx, count, &pipes, fd_in, fd_out);
                // Only the duplicates on the standard streams stay open.
                pipes.clear();
                let end = if idx + 1 < count {
                    starts[idx + 1]
                } else {
                    args.len()
                };
                exec_stage(&args[starts[idx]..end])
            }
            Err(err) => {
                eprintln!("Fork Failed");
                fork_error = Some(ShellError::new(
                    ErrorKind::Resource,
                    format!("fork: {err}"),
                ));
                break;
            }
        }
    }

    // Release the parent's pipe ends before waiting, or readers never see
    // end-of-stream.
    pipes.clear();

    let mut last_status = 0;
    for (idx, &child) in children.iter().enumerate() {
        let status = wait_for_child(child);
        debug!("chain event=exit idx={} pid={} code={}", idx, child, status);
        if idx + 1 == count {
            last_status = status;
        }
    }

    match fork_error {
        // Whatever was forked before the failure has been waited on above.
        Some(err) => Err(err),
        None => Ok(last_status),
    }
}

fn stage_starts(seps: &[isize]) -> Vec<usize> {
    let mut starts = vec![0usize];
    let mut offset = 0usize;
    for &delta in seps {
        if delta == SEG_END {
            break;
        }
        offset += delta as usize;
        starts.push(offset);
    }
    starts
}

/// Wires sibling `idx`'s standard streams: the previous pipe feeds stdin,
/// the next pipe takes stdout, and the two rim stages honor the redirect
/// descriptors instead.
fn wire_stage(
    idx: usize,
    count: usize,
    pipes: &[(OwnedFd, OwnedFd)],
    fd_in: Option<&File>,
    fd_out: Option<&File>,
) {
    let stdin_fd = if idx == 0 {
        fd_in.map(File::as_raw_fd)
    } else {
        Some(pipes[idx - 1].0.as_raw_fd())
    };
    let stdout_fd = if idx + 1 == count {
        fd_out.map(File::as_raw_fd)
    } else {
        Some(pipes[idx].1.as_raw_fd())
    };
    if let Some(fd) = stdin_fd {
        if dup2(fd, libc::STDIN_FILENO).is_err() {
            println!("Dup2 Error.");
            process::exit(1);
        }
    }
    if let Some(fd) = stdout_fd {
        if dup2(fd, libc::STDOUT_FILENO).is_err() {
            println!("Dup2 Error.");
            process::exit(1);
        }
    }
}
