use clap::Parser;
use rsitrader::cli::{run, Cli};
use rsitrader::init_logger;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.log_level()) {
        eprintln!("warning: logger unavailable: {e}");
    }
    run(cli)
}
