use anyhow::Result;
use clap::{Parser, Subcommand};
use hf_prompt_studio::app::{App, MISSING_KEY_HINT};
use hf_prompt_studio::config::KeyStatus;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hf-prompt-studio")]
#[command(about = "Generate images and text from a prompt with hosted inference models")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate an image and save it to disk.
    Image {
        prompt: String,
        /// Model id, e.g. black-forest-labs/FLUX.1-schnell.
        #[arg(long)]
        model: Option<String>,
        /// Output file or directory.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Generate a text continuation.
    Text {
        prompt: String,
        #[arg(long)]
        model: Option<String>,
    },
    /// Check the configured API key against the service.
    CheckKey,
    /// Show the resolved configuration.
    Env,
}

fn key_check_outcome(status: KeyStatus) -> hf_prompt_studio::Result<()> {
    match status {
        KeyStatus::Valid => {
            info!("API key is valid");
            Ok(())
        }
        KeyStatus::Unconfigured => {
            error!("{}", MISSING_KEY_HINT);
            Err(status.into_error())
        }
        other => Err(other.into_error()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hf_prompt_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    let app = App::new();

    let outcome = match args.command {
        Command::Image {
            prompt,
            model,
            output,
        } => app
            .generate_image(&prompt, model.as_deref(), output.as_deref())
            .await
            .map(|path| println!("{}", path.display())),
        Command::Text { prompt, model } => app
            .generate_text(&prompt, model.as_deref())
            .await
            .map(|text| println!("{}", text)),
        Command::CheckKey => key_check_outcome(app.check_key().await),
        Command::Env => {
            for (name, value) in app.environment_report() {
                println!("{:<20} {}", name, value);
            }
            Ok(())
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_check_outcome_maps_status_to_result() {
        assert!(key_check_outcome(KeyStatus::Valid).is_ok());

        let err = key_check_outcome(KeyStatus::Invalid).unwrap_err();
        assert_eq!(err.to_string(), "Invalid API key");

        let err = key_check_outcome(KeyStatus::Unconfigured).unwrap_err();
        assert!(matches!(err, hf_prompt_studio::Error::UnconfiguredKey));

        let err =
            key_check_outcome(KeyStatus::Unreachable("dns failure".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "dns failure");
    }

    #[test]
    fn test_cli_parses_text_command() {
        let args = CliArgs::try_parse_from(["hf-prompt-studio", "text", "once upon"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Text { ref prompt, model: None } if prompt == "once upon"
        ));
    }

    #[test]
    fn test_cli_parses_image_command() {
        let args = CliArgs::try_parse_from([
            "hf-prompt-studio",
            "image",
            "a red cube",
            "--model",
            "stabilityai/sdxl",
            "-o",
            "out.png",
        ])
        .unwrap();

        match args.command {
            Command::Image {
                prompt,
                model,
                output,
            } => {
                assert_eq!(prompt, "a red cube");
                assert_eq!(model.as_deref(), Some("stabilityai/sdxl"));
                assert_eq!(output, Some(PathBuf::from("out.png")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
