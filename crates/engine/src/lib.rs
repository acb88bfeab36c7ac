use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod action;
pub mod audio;
pub mod badges;
pub mod content;
pub mod dialogue;
pub mod progress;
pub mod pseudocode;
pub mod scene;
pub mod state;
pub mod storage;
pub mod timer;

pub use action::{Action, ChoiceSpec, Condition, Effect, Signal, VariableSource};
pub use audio::{AudioBackend, MusicTrack, SoundBoard, SoundCue, TracingAudio};
pub use badges::{Badge, BadgeBoard, BadgeId, BadgeTracker, BADGES};
pub use content::{Act, ActTable, ContentError};
pub use dialogue::DialogueEngine;
pub use progress::{ProgressTracker, Rank, XpReward};
pub use pseudocode::{PseudocodePanel, Snippet, SnippetTable};
pub use scene::{Helpers, Hotspot, Scene, SceneNavigator, SceneRegistry, SceneView};
pub use state::{GamePhase, GameState, GameStore, Stat, Value};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, StorageError};
pub use timer::{TimerHandle, TimerSlot};

pub const ROOT_ENV_VAR: &str = "CODERIBBEAN_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub save_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "{env_var} is set but does not point to a project root: {path}\n\
A project root contains Cargo.toml and a crates/ directory."
    )]
    InvalidEnvRoot {
        path: PathBuf,
        env_var: &'static str,
    },
    #[error(
        "Could not find the project root above {start_dir}\n\
Expected a directory containing Cargo.toml and crates/.\n\
Point {env_var} at the checkout, for example:\n\
export {env_var}=\"$HOME/src/coderibbean\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Locates the project root and makes sure the save directory exists.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let save_dir = root.join("save");
    fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
        path: save_dir.clone(),
        source,
    })?;
    Ok(AppPaths { root, save_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let candidate = normalize_path(Path::new(&value));
            if is_project_root(&candidate) {
                Ok(candidate)
            } else {
                Err(StartupError::InvalidEnvRoot {
                    path: candidate,
                    env_var: ROOT_ENV_VAR,
                })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            exe_dir
                .ancestors()
                .find(|candidate| is_project_root(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("crates").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
