mod args;
mod step;

use anyhow::{Context, Result};
use clap::Parser;
use imagesmith_core::decode::LoadOptions;
use imagesmith_core::{Destination, Exported, ImageSession, SessionOptions, StdoutSink};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let options = SessionOptions {
        filter: cli.filter,
        load: LoadOptions {
            auto_orient: cli.auto_orient,
        },
    };
    let mut session = ImageSession::open_with(&cli.input, options)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    for (index, step) in cli.steps.iter().enumerate() {
        step.apply(&mut session)
            .with_context(|| format!("step {} ({step:?}) failed", index + 1))?;
    }

    let format = cli
        .output_format(session.source_format())
        .context("no output format could be determined")?;

    let exported = if cli.stdout {
        let mut sink = StdoutSink {
            with_header: cli.header,
        };
        session.export_to_sink(format, cli.quality, &mut sink)
    } else {
        let destination = match &cli.output {
            Some(path) => Destination::Path(path.clone()),
            None => Destination::Original,
        };
        session.export(format, cli.quality, destination)
    }
    .context("export failed")?;

    if let Exported::File(path) = exported {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}
