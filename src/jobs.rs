//! Background job registry and reaper.
//!
//! The shell never blocks on a background child; instead every child it
//! detaches from is recorded here and collected with non-blocking waits,
//! driven by a SIGCHLD flag plus an unconditional sweep at the top of each
//! cycle. Unreaped children would otherwise accumulate as zombies for the
//! shell's lifetime.

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

pub struct Job {
    pub id: usize,
    pub pid: i32,
    pub command: String,
}

pub fn add_job(jobs: &mut Vec<Job>, next_job_id: &mut usize, pid: i32, command: &str) -> usize {
    let id = *next_job_id;
    *next_job_id += 1;
    debug!("job event=add id={} pid={}", id, pid);
    jobs.push(Job {
        id,
        pid,
        command: command.trim_end_matches('&').trim().to_string(),
    });
    id
}

pub fn reap_jobs(jobs: &mut Vec<Job>) {
    let mut index = 0;
    while index < jobs.len() {
        if job_finished(jobs[index].pid) {
            let job = jobs.remove(index);
            debug!("job event=reap id={} pid={}", job.id, job.pid);
            println!("[{}] Done {}", job.id, job.command);
        } else {
            index += 1;
        }
    }
}

fn job_finished(pid: i32) -> bool {
    loop {
        match waitpid(Pid::from_raw(pid), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, _)) | Ok(WaitStatus::Signaled(_, _, _)) => return true,
            Ok(WaitStatus::StillAlive) => return false,
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            // Already collected elsewhere; drop the record either way.
            Err(Errno::ECHILD) => return true,
            Err(_) => return false,
        }
    }
}
