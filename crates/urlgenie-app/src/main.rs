//! UrlGenie application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Install the tracing subscriber (stderr)
//! 3. Build the Gemini model client and the chat session
//! 4. Run the terminal chat loop, or serve the JSON API

mod cli;
mod render;
mod repl;

use std::sync::Arc;

use clap::Parser;

use urlgenie_api::routes;
use urlgenie_api::state::AppState;
use urlgenie_chat::session::lock_session;
use urlgenie_chat::{ChatSession, ModelClient, ResponseCoordinator, VoiceInput};
use urlgenie_core::config::UrlGenieConfig;
use urlgenie_core::error::UrlGenieError;
use urlgenie_gemini::GeminiClient;

use cli::{CliArgs, Command};
use repl::Repl;

/// Load the config file.
///
/// A file named with --config must load. Otherwise a missing or broken file
/// falls back to defaults; the reason is returned so it can be logged once
/// tracing is up.
fn load_config(args: &CliArgs) -> Result<(UrlGenieConfig, Option<String>), UrlGenieError> {
    let path = args.resolve_config_path();
    if args.config_is_explicit() {
        return Ok((UrlGenieConfig::load(&path)?, None));
    }
    if !path.exists() {
        return Ok((UrlGenieConfig::default(), None));
    }
    match UrlGenieConfig::load(&path) {
        Ok(config) => Ok((config, None)),
        Err(e) => Ok((
            UrlGenieConfig::default(),
            Some(format!("{}: {}", path.display(), e)),
        )),
    }
}

/// Voice recognizer for this platform. None ships with the binary.
fn platform_voice(config: &UrlGenieConfig) -> VoiceInput {
    VoiceInput::new(None, config.voice.language.clone())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let (mut config, load_warning) = load_config(&args)?;

    // Tracing. Logs go to stderr so they never interleave with the transcript.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting UrlGenie v{}", env!("CARGO_PKG_VERSION"));
    if let Some(warning) = load_warning {
        tracing::warn!("Failed to load config from {}. Using defaults.", warning);
    }

    // Model.
    let gemini = GeminiClient::from_config(&config.model);
    if !gemini.has_api_key() {
        tracing::warn!(
            env = %config.model.api_key_env,
            "No API key configured; questions will fail until one is set"
        );
    }
    tracing::info!(model = %gemini.model(), "Model client ready");
    let model: Arc<dyn ModelClient> = Arc::new(gemini);
    let voice = platform_voice(&config);

    match args.command() {
        Command::Chat => {
            let session = ChatSession::new(&config.chat).into_shared();
            if let Some(ref url) = args.url {
                lock_session(&session)?.set_url(url)?;
            }
            let coordinator = ResponseCoordinator::new(session, model, &config.chat);
            Repl::new(coordinator, voice).run().await?;
        }
        Command::Serve => {
            config.server.port = args.resolve_port(config.server.port);
            let server = config.server.clone();
            let state = AppState::new(config, model, voice);
            if let Some(ref url) = args.url {
                lock_session(&state.session)?.set_url(url)?;
            }
            routes::start_server(&server, state).await?;
        }
    }

    Ok(())
}
