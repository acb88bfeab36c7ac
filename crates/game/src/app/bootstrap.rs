use std::env;
use std::time::Duration;

use engine::dialogue::DEFAULT_TEXT_SPEED;
use engine::{resolve_app_paths, ContentError, FileKeyValueStore, StartupError, TracingAudio};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::commands::CommandRegistry;
use super::content::load_game_content;
use super::session::GameSession;

const TEXT_SPEED_ENV_VAR: &str = "CODERIBBEAN_TEXT_SPEED_MS";
const MUTED_ENV_VAR: &str = "CODERIBBEAN_MUTED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoopConfig {
    /// Typewriter tick. Zero prints each line whole.
    pub(crate) text_speed: Duration,
    /// Mutes this run without touching the saved preference.
    pub(crate) force_mute: bool,
    /// Sleep between typewriter ticks. Off for scripted input.
    pub(crate) pace_output: bool,
    /// Upper bound on the wall time fed to timers between two commands.
    pub(crate) max_frame_delta: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            text_speed: DEFAULT_TEXT_SPEED,
            force_mute: false,
            pace_output: true,
            max_frame_delta: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("command registration failed: {0}")]
    Commands(String),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) session: GameSession,
    pub(crate) commands: CommandRegistry,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Pirates of the Coderibbean Startup ===");

    let config = loop_config_from_env();
    let paths = resolve_app_paths()?;
    let content = load_game_content()?;
    let commands = CommandRegistry::with_game_commands().map_err(AppError::Commands)?;
    let storage = FileKeyValueStore::new(paths.save_dir.clone());
    let session = GameSession::new(content, &config, storage, Box::new(TracingAudio));
    info!(
        root = %paths.root.display(),
        save_dir = %paths.save_dir.display(),
        "app_wired"
    );

    Ok(AppWiring {
        config,
        session,
        commands,
    })
}

/// Logs go to stderr; stdout belongs to the game text.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn loop_config_from_env() -> LoopConfig {
    let mut config = LoopConfig::default();
    if let Some(speed) = parse_text_speed(env::var(TEXT_SPEED_ENV_VAR).ok().as_deref()) {
        config.text_speed = speed;
    }
    config.force_mute = parse_flag(env::var(MUTED_ENV_VAR).ok().as_deref());
    config
}

fn parse_text_speed(raw: Option<&str>) -> Option<Duration> {
    let raw = raw?.trim();
    match raw.parse::<u64>() {
        Ok(millis) => Some(Duration::from_millis(millis)),
        Err(_) => {
            warn!(var = TEXT_SPEED_ENV_VAR, value = raw, "env_value_ignored");
            None
        }
    }
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
