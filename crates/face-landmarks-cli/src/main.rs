//! Face Landmarks CLI - detect faces and facial landmarks in an image.

use clap::error::ErrorKind;
use clap::Parser;
use face_landmarks_adapters::set_models_dir;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::detect::DetectArgs;
use commands::{Cli, Commands, ExitCode};
use config::AppConfig;
use output::JsonOutput;

fn main() -> std::process::ExitCode {
    let args: Vec<_> = std::env::args_os().collect();

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ if commands::targets_subcommand(&args) => e.exit(),
            _ => return commands::usage_error(&JsonOutput::stdout(false)).into(),
        },
    };

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // An image path alongside a subcommand is still a second positional argument
    if cli.command.is_some() && !cli.detect.paths.is_empty() {
        return commands::usage_error(&JsonOutput::stdout(false)).into();
    }

    let config = AppConfig::load();

    // Models directory: CLI > config > XDG default
    if let Some(dir) = cli.models_dir.clone().or_else(|| config.models.dir.clone()) {
        debug!("Using custom models directory: {}", dir.display());
        set_models_dir(Some(dir));
    }

    let exit_code = match cli.command {
        Some(Commands::Annotate(ref args)) => {
            match commands::annotate::run(args, &config, cli.cpu) {
                Ok(code) => code,
                Err(e) => {
                    eprintln!("error: {e:#}");
                    ExitCode::Error
                }
            }
        }
        Some(Commands::Models(ref args)) => match commands::models::run(args, &config) {
            Ok(()) => ExitCode::Success,
            Err(e) => {
                eprintln!("error: {e:#}");
                ExitCode::Error
            }
        },
        None => {
            let args = DetectArgs::with_config(cli.detect.clone(), &config);
            commands::detect::run(&args, &config, cli.cpu)
        }
    };

    exit_code.into()
}
