mod args;
mod console;

use std::io;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn, LevelFilter};
use snafu::{whatever, ErrorCompat, ResultExt};

use smart_voting::{ElectionSystem, JsonFileStore, ResultRules, TieBreakMode, DEFAULT_STORE_PATH};

use crate::args::Args;
use crate::console::{AppResult, Console, ElectionSnafu};

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn validate_rules(args: &Args) -> AppResult<ResultRules> {
    let tiebreak_mode = match args.tiebreak.as_deref() {
        None | Some("candidate-order") => {
            if args.seed.is_some() {
                warn!("validate_rules: --seed is only used by the random tiebreak");
            }
            TieBreakMode::UseCandidateOrder
        }
        Some("random") => TieBreakMode::Random(args.seed.unwrap_or(0)),
        Some(x) => {
            whatever!(
                "Cannot use tiebreak mode {:?} (expected candidate-order or random)",
                x
            )
        }
    };
    Ok(ResultRules { tiebreak_mode })
}

fn run(args: &Args) -> AppResult<()> {
    let rules = validate_rules(args)?;
    let path = args
        .store
        .clone()
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());
    info!("run: opening store {:?} with rules {:?}", path, rules);
    let system = ElectionSystem::open(JsonFileStore::new(path), rules).context(ElectionSnafu)?;

    let stdin = io::stdin();
    let mut console = Console::new(system, stdin.lock(), io::stdout(), !args.no_clear);
    console.run()
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(&args) {
        error!("main: session aborted: {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
