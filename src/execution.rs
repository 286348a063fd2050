//! Execution selector: the one component that turns a parsed line into
//! processes.
//!
//! Per cycle it handles the `exit` sentinel, opens redirect files, forks the
//! cycle's single direct child, and either waits for it (foreground) or
//! records it as a background job. The child dispatches to the configured
//! pipeline orchestrator or execs directly.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::process;

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{dup2, execvp, fork, ForkResult, Pid};

mod chain;
mod fall;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::jobs::{add_job, Job};
use crate::parse::{plan_pipeline, ParsedLine};
use crate::signals::reset_child_signals;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipeStrategy {
    /// Nested forks, rightmost stage outermost. Canonical.
    Fall,
    /// Sibling forks over pre-created pipes.
    Chain,
}

pub fn parse_strategy_value(value: &str) -> ShellResult<PipeStrategy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "fall" | "default" => Ok(PipeStrategy::Fall),
        "chain" => Ok(PipeStrategy::Chain),
        _ => Err(
            ShellError::new(ErrorKind::Parse, format!("invalid pipe strategy: {value}"))
                .with_context("valid values: fall, chain"),
        ),
    }
}

pub enum CycleOutcome {
    Continue,
    /// The `exit` sentinel: the loop stops with status 0.
    Exit,
    /// Top-level fork failed: the program stops with status 1.
    Fatal,
}

pub fn execute_parsed(
    parsed: &ParsedLine,
    display: &str,
    strategy: PipeStrategy,
    jobs: &mut Vec<Job>,
    next_job_id: &mut usize,
) -> CycleOutcome {
    if parsed.args[0] == "exit" {
        return CycleOutcome::Exit;
    }

    let (fd_in, fd_out) = match open_redirects(parsed) {
        Ok(pair) => pair,
        Err(err) => {
            debug!("exec event=open error=\"{}\"", err.message);
            println!("Open Error.");
            return CycleOutcome::Continue;
        }
    };

    let child = match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => child,
        Ok(ForkResult::Child) => run_child(parsed, strategy, fd_in.as_ref(), fd_out.as_ref()),
        Err(err) => {
            debug!("exec event=fork error={}", err);
            eprintln!("Fork Failed");
            return CycleOutcome::Fatal;
        }
    };

    debug!(
        "exec event=spawn pid={} stages={} background={}",
        child,
        parsed.pipe_count() + 1,
        parsed.background
    );

    if parsed.background {
        let id = add_job(jobs, next_job_id, child.as_raw(), display);
        println!("[{id}] {}", child.as_raw());
    } else {
        wait_for_child(child);
    }
    // fd_in/fd_out drop here: the shell's copies close once the owning
    // foreground child is gone; the child keeps its inherited duplicates.
    CycleOutcome::Continue
}

/// Everything past the cycle fork. Never returns: every path execs or exits.
fn run_child(
    parsed: &ParsedLine,
    strategy: PipeStrategy,
    fd_in: Option<&File>,
    fd_out: Option<&File>,
) -> ! {
    reset_child_signals();

    if parsed.has_pipe() {
        match strategy {
            PipeStrategy::Fall => {
                let plan = plan_pipeline(&parsed.seps);
                match fall::run_fall(&parsed.args, &plan, parsed.args.len(), fd_in, fd_out) {
                    Ok(never) => match never {},
                    // Diagnostic already printed at the failing level.
                    Err(_) => process::exit(1),
                }
            }
            PipeStrategy::Chain => match chain::run_chain(&parsed.args, &parsed.seps, fd_in, fd_out)
            {
                Ok(status) => process::exit(status),
                Err(_) => process::exit(1),
            },
        }
    }

    if let Some(file) = fd_in {
        if dup2(file.as_raw_fd(), libc::STDIN_FILENO).is_err() {
            println!("Dup2 Error.");
            process::exit(1);
        }
    }
    if let Some(file) = fd_out {
        if dup2(file.as_raw_fd(), libc::STDOUT_FILENO).is_err() {
            println!("Dup2 Error.");
            process::exit(1);
        }
    }
    exec_stage(&parsed.args)
}

fn open_redirects(parsed: &ParsedLine) -> ShellResult<(Option<File>, Option<File>)> {
    let fd_in = match parsed.infile {
        Some(ref path) => Some(
            OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(|err| ShellError::new(ErrorKind::Open, format!("{path}: {err}")))?,
        ),
        None => None,
    };
    let fd_out = match parsed.outfile {
        Some(ref path) => Some(
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o644)
                .open(path)
                .map_err(|err| ShellError::new(ErrorKind::Open, format!("{path}: {err}")))?,
        ),
        None => None,
    };
    Ok((fd_in, fd_out))
}

/// Replaces the current process image with one stage's command.
///
/// Only returns control on failure, which is reported with the not-found
/// diagnostic and a distinct non-zero status.
pub(crate) fn exec_stage(args: &[String]) -> ! {
    let argv: Result<Vec<CString>, _> = args
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect();
    let Ok(argv) = argv else {
        eprintln!(
            "{}",
            ShellError::new(ErrorKind::Exec, "argument contains a nul byte")
        );
        process::exit(126);
    };
    let _ = execvp(&argv[0], &argv);
    println!("No command '{}' found.", args[0]);
    process::exit(127);
}

/// Blocks until `pid` terminates, retrying on EINTR; returns its exit code
/// (128 + signal number for signal deaths).
pub(crate) fn wait_for_child(pid: Pid) -> i32 {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("exec event=exit pid={} code={}", pid, code);
                return code;
            }
            Ok(WaitStatus::Signaled(_, sig, _)) => {
                debug!("exec event=signal pid={} signal={}", pid, sig as i32);
                return 128 + sig as i32;
            }
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(err) => {
                debug!("exec event=wait pid={} error={}", pid, err);
                return 1;
            }
        }
    }
}
