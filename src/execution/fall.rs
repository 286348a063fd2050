//! Nested pipeline orchestrator.
//!
//! One fork per stage, nested: each level's parent becomes the rightmost
//! remaining stage after waiting for its child, and the child either execs
//! the leftmost stage or recurses for the stages in between. Process depth
//! equals stage count, and every stage transitively waits for everything
//! typed to its left before loading its command image.

use std::convert::Infallible;
use std::fs::File;
use std::os::fd::AsRawFd;
use std::process;

use nix::unistd::{dup2, fork, pipe, ForkResult};

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::execution::{exec_stage, wait_for_child};
use crate::parse::SEG_END;

/// Runs one level of the nest and recurses for the rest.
///
/// `plan` is the planner's reverse-ordered offset array (head = current
/// stage); `stage_end` is where the current stage's tokens stop — the first
/// call passes `args.len()`. The input descriptor is honored only by the
/// innermost level, the output descriptor only by this outermost call.
/// Every path either replaces the process image or exits; an `Err` means
/// pipe or fork creation failed before this level's stage was wired, with
/// the diagnostic already printed.
pub(crate) fn run_fall(
    args: &[String],
    plan: &[isize],
    stage_end: usize,
    fd_in: Option<&File>,
    fd_out: Option<&File>,
) -> ShellResult<Infallible> {
    let offset = plan[0] as usize;

    let (read_end, write_end) = match pipe() {
        Ok(ends) => ends,
        Err(err) => {
            eprintln!("Pipe Failed");
            return Err(ShellError::new(
                ErrorKind::Resource,
                format!("pipe: {err}"),
            ));
        }
    };

    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            // This process becomes the rightmost remaining stage: pipe
            // output feeds its stdin, unused ends close immediately.
            drop(write_end);
            let stdin_wired = dup2(read_end.as_raw_fd(), libc::STDIN_FILENO);
            drop(read_end);
            let stdout_wired = match fd_out {
                Some(file) => dup2(file.as_raw_fd(), libc::STDOUT_FILENO).map(drop),
                None => Ok(()),
            };
            // Reap the child before surfacing any wiring failure so a
            // botched level never orphans what it already forked.
            wait_for_child(child);
            if stdin_wired.is_err() || stdout_wired.is_err() {
                return Err(ShellError::new(ErrorKind::Resource, "dup2 failed"));
            }
            exec_stage(&args[offset..stage_end])
        }
        Ok(ForkResult::Child) => {
            drop(read_end);
            let wired = dup2(write_end.as_raw_fd(), libc::STDOUT_FILENO);
            drop(write_end);
            if wired.is_err() {
                println!("Dup2 Error.");
                process::exit(1);
            }
            let rest = &plan[1..];
            if rest[1] == SEG_END {
                // Innermost level: the leftmost-typed stage, the only one
                // that honors the input redirect.
                if let Some(file) = fd_in {
                    if dup2(file.as_raw_fd(), libc::STDIN_FILENO).is_err() {
                        println!("Dup2 Error.");
                        process::exit(1);
                    }
                }
                exec_stage(&args[rest[0] as usize..offset])
            }
            // The pipe already wired this process's output; no override
            // may reach deeper levels.
            match run_fall(args, rest, offset, fd_in, None) {
                Ok(never) => match never {},
                Err(_) => process::exit(1),
            }
        }
        Err(err) => {
            eprintln!("Fork Failed");
            Err(ShellError::new(
                ErrorKind::Resource,
                format!("fork: {err}"),
            ))
        }
    }
}
