use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Sort a batch of images into folders using an image classification model.
#[derive(Debug, Parser)]
#[command(name = "image-sorter", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "IMAGE_SORTER_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match image_sorter_lib::run(&cli.config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
