use std::{
    fs,
    io::{Write, stderr, stdout},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use simplelog::{LevelFilter, WriteLogger};

use nbrecover::config::ConverterConfig;
use nbrecover::converter::NotebookConverter;
use nbrecover::panic_handler;

/// Recover a Jupyter notebook from JupyterLab HTML exports
#[derive(Parser, Debug)]
#[command(name = "nbrecover")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Exported HTML files, concatenated in the order given
    #[arg(required = true)]
    html_files: Vec<PathBuf>,

    /// Write the notebook to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug-level diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,

    /// JSON converter configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report containers that are neither markdown nor code cells
    #[arg(long)]
    warn_unrecognized: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the notebook, so logs go to stderr
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    WriteLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_max_level(LevelFilter::Debug)
            .add_filter_ignore_str("html5ever")
            .build(),
        stderr(),
    )?;

    panic_handler::initialize_panic_handler();

    let mut config = ConverterConfig::load_or_default(cli.config.as_deref());
    if cli.warn_unrecognized {
        config.report_unrecognized = true;
    }

    info!("Converting {} HTML file(s)", cli.html_files.len());
    let converter = NotebookConverter::new(config);
    let run = converter.convert_files(&cli.html_files);

    let failed = run.failures().count();
    if failed > 0 {
        warn!("{failed} of {} file(s) could not be converted", run.sources.len());
    }

    let document = run.into_document().context("No notebook written")?;
    let json = document.to_json().context("Failed to serialize notebook")?;

    match &cli.output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} cells to {}", document.len(), path.display());
        }
        None => {
            let mut out = stdout().lock();
            out.write_all(json.as_bytes())
                .context("Failed to write notebook to stdout")?;
            out.flush()?;
        }
    }

    Ok(())
}
