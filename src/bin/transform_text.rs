//! Upper-case a text file, writing to `--output` or echoing to stdout.

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "transform-text")]
#[command(version, about = "Upper-case a text file", long_about = None)]
struct Cli {
    #[arg(long, help = "Input file path")]
    input: PathBuf,

    #[arg(long, help = "Output file path (prints to stdout if omitted)")]
    output: Option<PathBuf>,

    #[arg(long, short, help = "Show verbose debug output")]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    datakit::logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();
    datakit::text::process_file(&cli.input, cli.output.as_deref(), &mut stdout)?;
    Ok(())
}
