mod args;
mod hcv;

use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("args: {:?}", args);

    if let Err(e) = hcv::run_election_cli(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        for cause in e.iter_chain().skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
