//! Models command - manage ML models.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use face_landmarks_adapters::models::{
    ensure_models_with_progress, list_models as adapter_list_models, models_dir, ProgressCallback,
    BASE_URL_ENV, MODELS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

use crate::config::AppConfig;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download required models
    Fetch {
        /// Base URL the model files are served from
        #[arg(long, env = BASE_URL_ENV, value_name = "URL")]
        base_url: Option<String>,
    },
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    match args.command {
        ModelsCommand::Fetch { ref base_url } => {
            let base_url = resolve_base_url(base_url.as_deref(), config)?;
            fetch_models(&base_url)
        }
        ModelsCommand::List => list_models(),
        ModelsCommand::Path => print_path(),
    }
}

/// CLI flag or environment first, then `models.base_url`.
fn resolve_base_url(cli: Option<&str>, config: &AppConfig) -> Result<String> {
    cli.map(str::to_string)
        .or_else(|| config.models.base_url.clone())
        .with_context(|| {
            format!(
                "No model base URL. Pass --base-url, set {BASE_URL_ENV} or models.base_url"
            )
        })
}

fn fetch_models(base_url: &str) -> Result<()> {
    let pb = Arc::new(ProgressBar::new(0));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
            .progress_chars("#>-"),
    );

    let current_model: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let pb_clone = Arc::clone(&pb);
    let model_clone = Arc::clone(&current_model);

    let progress: ProgressCallback =
        Box::new(move |name: &str, downloaded: u64, total: Option<u64>| {
            let is_new_model = {
                let mut current = model_clone
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                if *current == name {
                    false
                } else {
                    *current = name.to_string();
                    true
                }
            };
            if is_new_model {
                pb_clone.set_length(total.unwrap_or(0));
                pb_clone.set_message(name.to_string());
            }
            pb_clone.set_position(downloaded);
        });

    ensure_models_with_progress(base_url, Some(&progress))?;

    pb.finish_with_message("All models downloaded");
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn list_models() -> Result<()> {
    let models = adapter_list_models();
    let dir = models_dir();

    println!("Models directory: {}", dir.display());
    println!();

    for (name, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        let info = MODELS.iter().find(|m| m.name == name);
        let filename = info.map_or("unknown", |m| m.filename);
        println!("  {status} {name} ({filename})");
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, models.len());

    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
fn print_path() -> Result<()> {
    println!("{}", models_dir().display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_base_url_wins() {
        let mut config = AppConfig::default();
        config.models.base_url = Some("https://config.example".to_string());

        let url = resolve_base_url(Some("https://cli.example"), &config).unwrap();
        assert_eq!(url, "https://cli.example");
    }

    #[test]
    fn test_config_base_url_fallback() {
        let mut config = AppConfig::default();
        config.models.base_url = Some("https://config.example".to_string());

        let url = resolve_base_url(None, &config).unwrap();
        assert_eq!(url, "https://config.example");
    }

    #[test]
    fn test_missing_base_url_is_an_error() {
        let err = resolve_base_url(None, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--base-url"));
    }
}
