use anyhow::Context;
use clap::Parser;
use hydromet_processor::StationProcessor;
use hydromet_processor::cli::{Args, setup_logging};
use std::process;

fn main() {
    let args = Args::parse();
    setup_logging(&args);

    match run(&args) {
        Ok(true) => process::exit(0),
        Ok(false) => {
            eprintln!("Error: one or more pipelines failed");
            process::exit(1);
        }
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Run all configured pipelines; returns whether every pipeline succeeded
fn run(args: &Args) -> anyhow::Result<bool> {
    let config = args.build_config()?;
    let processor = StationProcessor::new(config).context("Invalid configuration")?;
    let stats = processor.process()?;
    Ok(!stats.has_failures())
}
