use anyhow::Result;
use clap::Parser;
use clfstat::{
    analyze::{analyze_file, resolve_input, Input},
    report, CombinedParser,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Access log file, or a directory holding `*access.log*` files
    path: PathBuf,
}

fn process_path(path: &Path) -> Result<()> {
    let files = match resolve_input(path)? {
        Input::Files(files) => files,
        Input::Invalid => {
            tracing::error!("Path not found: {}", path.display());
            return Ok(());
        }
    };

    let parser = CombinedParser::default();
    for file in files {
        let analysis = analyze_file(&file, &parser)?;
        println!("{}", report::to_json(&analysis.summary)?);
        let out = report::save(&analysis.summary, &file, Path::new("."))?;
        tracing::info!("Stats saved to {}", out.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    std::env::set_var(
        "RUST_LOG",
        format!("info,{}", std::env::var("RUST_LOG").unwrap_or_default()),
    );
    let enable_color = std::env::var("NO_COLOR").is_err();
    tracing_subscriber::fmt()
        .with_thread_ids(true)
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(enable_color)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    tracing::debug!("{:?}", args);

    process_path(&args.path)
}
