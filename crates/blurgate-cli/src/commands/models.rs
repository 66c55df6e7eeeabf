//! Models command - manage classifier artifacts.

use std::path::PathBuf;

use anyhow::Result;
use blurgate_adapters::models::CLASSIFIER_NAME;
use blurgate_adapters::{ModelStore, ProgressCallback};
use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Install a classifier artifact from a local file
    Install(InstallArgs),
    /// List installed artifacts
    List,
    /// Print model directory path
    Path,
}

/// Arguments for `models install`
#[derive(Args)]
pub struct InstallArgs {
    /// Local safetensors file to install
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Expected SHA-256 of the artifact, as hex
    #[arg(long, value_name = "HEX")]
    pub sha256: Option<String>,

    /// Name to install the artifact under
    #[arg(long, default_value = CLASSIFIER_NAME)]
    pub name: String,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    let store = args
        .models_dir
        .clone()
        .or_else(|| config.model.dir.clone())
        .map_or_else(ModelStore::default, ModelStore::new);

    match &args.command {
        ModelsCommand::Install(install) => install_model(&store, install),
        ModelsCommand::List => list_models(&store),
        ModelsCommand::Path => {
            println!("{}", store.dir().display());
            Ok(())
        }
    }
}

fn install_model(store: &ModelStore, args: &InstallArgs) -> Result<()> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );
    pb.set_message(args.name.clone());

    let bar = pb.clone();
    let progress: ProgressCallback = Box::new(move |_name: &str, done: u64, total: Option<u64>| {
        if let Some(t) = total {
            bar.set_length(t);
        }
        bar.set_position(done);
    });

    let path = store.install_file(&args.name, &args.file, args.sha256.as_deref(), Some(&progress))?;

    pb.finish_with_message(format!("Installed {}", args.name));
    println!("{}", path.display());
    Ok(())
}

fn list_models(store: &ModelStore) -> Result<()> {
    let models = store.list()?;

    println!("Models directory: {}", store.dir().display());
    println!();

    for model in &models {
        let marker = if model.name == CLASSIFIER_NAME {
            " (default classifier)"
        } else {
            ""
        };
        println!("  {} {} bytes{marker}", model.name, model.size);
    }

    if !models.is_empty() {
        println!();
    }
    println!("{} model(s) installed", models.len());

    Ok(())
}
