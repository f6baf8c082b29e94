//! Tunable gameplay constants.
//!
//! Defaults live in code; a JSON file may override any subset of fields. A missing file is not an
//! error, a malformed one is.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TUNABLES_PATH: &str = "assets/config/tunables.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tunables in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub starting_lives: u32,
    /// Minimum time between shots; also how long the shooting pose is held.
    pub shot_cooldown_secs: f32,
    pub invincibility_secs: f32,
    pub power_up_secs: f32,
    pub bullet_speed: f32,
    pub bullet_lifetime_secs: f32,
    pub enemy_kill_score: u64,
    pub boss_kill_score: u64,
    pub score_ball_points: u64,
    pub log_capacity: usize,
    /// JSON-lines copy of the pattern log. `None` keeps the log in memory only.
    pub log_file: Option<String>,
    /// LDtk project under `assets/` to play instead of the built-in stage.
    pub ldtk_project: Option<String>,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            shot_cooldown_secs: 0.25,
            invincibility_secs: 1.0,
            power_up_secs: 12.0,
            bullet_speed: 420.0,
            bullet_lifetime_secs: 1.2,
            enemy_kill_score: 500,
            boss_kill_score: 5000,
            score_ball_points: 1000,
            log_capacity: crate::pattern_log::DEFAULT_CAPACITY,
            log_file: Some("game.log".to_owned()),
            ldtk_project: None,
        }
    }
}

impl Tunables {
    /// Reads overrides from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
