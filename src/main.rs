use std::env;
use std::io;
use std::process;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use signal_hook::consts::signal::SIGCHLD;
use signal_hook::flag;

mod error;
mod execution;
mod io_helpers;
mod jobs;
mod parse;
mod signals;

use execution::{execute_parsed, parse_strategy_value, CycleOutcome, PipeStrategy};
use io_helpers::LineSource;
use jobs::{reap_jobs, Job};
use parse::tokenize_line;
use signals::install_signal_handlers;

const PROMPT: &str = "osh> ";

fn main() {
    init_logging();
    let mut strategy = PipeStrategy::Fall;
    for arg in env::args().skip(1) {
        if let Some(value) = arg.strip_prefix("--pipe-strategy=") {
            match parse_strategy_value(value) {
                Ok(parsed) => strategy = parsed,
                Err(err) => {
                    eprintln!("error: {err}");
                    process::exit(2);
                }
            }
        }
    }
    if let Err(err) = install_signal_handlers() {
        eprintln!("error: {err}");
        return;
    }
    let source = match LineSource::new() {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return;
        }
    };
    let sigchld_flag = Arc::new(AtomicBool::new(false));
    if let Err(err) = flag::register(SIGCHLD, Arc::clone(&sigchld_flag)) {
        eprintln!("error: {err}");
        return;
    }

    let mut state = ShellState {
        source,
        sigchld_flag,
        strategy,
        last_line: None,
        jobs: Vec::new(),
        next_job_id: 1,
    };

    loop {
        match run_once(&mut state) {
            Ok(CycleOutcome::Continue) => {}
            Ok(CycleOutcome::Exit) => process::exit(0),
            Ok(CycleOutcome::Fatal) => process::exit(1),
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("ROSH_LOG", "info");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn run_once(state: &mut ShellState) -> io::Result<CycleOutcome> {
    if state.sigchld_flag.swap(false, Ordering::SeqCst) {
        reap_jobs(&mut state.jobs);
    }
    reap_jobs(&mut state.jobs);

    let line = match state.source.next_line(PROMPT)? {
        Some(line) => line,
        None => {
            if state.source.interactive() {
                println!();
            }
            return Ok(CycleOutcome::Exit);
        }
    };

    let mut line = line.trim().to_string();
    if line.is_empty() {
        return Ok(CycleOutcome::Continue);
    }

    if line == "!!" {
        match state.last_line.clone() {
            Some(previous) => line = previous,
            None => {
                println!("No commands in history.");
                return Ok(CycleOutcome::Continue);
            }
        }
    }

    let parsed = match tokenize_line(&line) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            return Ok(CycleOutcome::Continue);
        }
    };
    // The replay slot only ever holds a line that parsed.
    state.last_line = Some(line.clone());

    Ok(execute_parsed(
        &parsed,
        &line,
        state.strategy,
        &mut state.jobs,
        &mut state.next_job_id,
    ))
}

struct ShellState {
    source: LineSource,
    sigchld_flag: Arc<AtomicBool>,
    strategy: PipeStrategy,
    /// Single-slot replay history consulted by the `!!` marker.
    last_line: Option<String>,
    jobs: Vec<Job>,
    next_job_id: usize,
}
