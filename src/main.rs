//! Stevedore CLI: declarative bootstrapper for docker-compose clusters.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "stevedore",
    version,
    about = "Declarative bootstrapper for docker-compose clusters: workdirs, files, volumes, SSH aliases and admin keys"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: stevedore::cli::Commands,
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    if let Err(e) = stevedore::cli::dispatch(cli.command) {
        log::debug!("failure kind: {:?}", e.kind());
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}
