use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use test_case_splitter::split_file;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "test-case-splitter",
    version,
    about = "Split a hex text fixture into one binary .test file per test case"
)]
struct Cli {
    /// Text fixture containing `TEST=<name>` blocks of hex pairs
    input: PathBuf,
    /// Existing directory that receives the `<name>.test` files
    out_dir: PathBuf,
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    split_file(&cli.input, &cli.out_dir)?;
    Ok(())
}
