//! Command-line walkthrough of the docstore client.
//!
//! Runs against the in-memory driver, so each invocation starts with an empty
//! store; `--seed` loads the sample users first. Results are printed to
//! stdout as JSON, failures are logged and exit with status 1.

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use commands::Demo;
use std::process::ExitCode;

fn main() -> ExitCode {
    colog::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let demo = Demo::new(cli);
    if cli.seed {
        demo.seed()?;
    }
    for line in demo.execute(&cli.command)? {
        println!("{}", line);
    }
    Ok(())
}
