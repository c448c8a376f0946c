//! Application-level configuration loading: the runtime team colors set and
//! the join-link base URL.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::game::TeamColor;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CROWD_CLASH_CONFIG_PATH";
/// Fallback color returned when the colors set is exhausted.
const DEFAULT_COLOR: TeamColor = TeamColor {
    h: 0.0,
    s: 0.0,
    v: 1.0,
};

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    colors: Vec<TeamColor>,
    join_base_url: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in
    /// defaults when the file is absent or unreadable.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        colors = app_config.colors.len(),
                        join_base = app_config.join_base_url.is_some(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Return the first colors set entry not already listed in `used`.
    ///
    /// When every entry is taken we fall back to [`DEFAULT_COLOR`] so callers
    /// always receive a value.
    pub fn first_unused_color(&self, used: &[TeamColor]) -> TeamColor {
        self.colors
            .iter()
            .find(|candidate| used.iter().all(|existing| existing != *candidate))
            .cloned()
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Build the join link for a game. The configured base URL wins; when
    /// unset the serving origin observed on the request is used instead.
    pub fn join_link(&self, request_origin: Option<&str>, game_id: Uuid) -> Option<String> {
        self.join_base_url
            .as_deref()
            .or(request_origin)
            .map(|base| format!("{}/join/{game_id}", base.trim_end_matches('/')))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            colors: default_colors(),
            join_base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    colors: Vec<RawColor>,
    #[serde(default)]
    join_base_url: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let colors = value.colors.into_iter().map(Into::into).collect::<Vec<_>>();
        Self {
            colors,
            join_base_url: value.join_base_url,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of a single HSV entry inside the configuration file.
struct RawColor {
    hue: f32,
    saturation: f32,
    value: f32,
}

impl From<RawColor> for TeamColor {
    fn from(value: RawColor) -> Self {
        Self {
            h: value.hue,
            s: value.saturation,
            v: value.value,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in colors set shipped with the binary.
fn default_colors() -> Vec<TeamColor> {
    vec![
        TeamColor {
            h: 4.0,
            s: 0.85,
            v: 1.0,
        },
        TeamColor {
            h: 210.0,
            s: 0.85,
            v: 1.0,
        },
        TeamColor {
            h: 130.0,
            s: 0.8,
            v: 0.95,
        },
        TeamColor {
            h: 48.0,
            s: 0.95,
            v: 1.0,
        },
        TeamColor {
            h: 280.0,
            s: 0.7,
            v: 1.0,
        },
        TeamColor {
            h: 175.0,
            s: 0.8,
            v: 0.95,
        },
        TeamColor {
            h: 330.0,
            s: 0.7,
            v: 1.0,
        },
        TeamColor {
            h: 25.0,
            s: 0.9,
            v: 1.0,
        },
        TeamColor {
            h: 95.0,
            s: 0.6,
            v: 0.9,
        },
        TeamColor {
            h: 255.0,
            s: 0.55,
            v: 1.0,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_are_handed_out_without_repeats() {
        let config = AppConfig::default();
        let first = config.first_unused_color(&[]);
        let second = config.first_unused_color(&[first.clone()]);
        assert_ne!(first, second);
    }

    #[test]
    fn join_link_prefers_configured_base() {
        let game_id = Uuid::new_v4();
        let mut config = AppConfig::default();
        config.join_base_url = Some("https://party.example/".into());

        let link = config
            .join_link(Some("http://localhost:8080"), game_id)
            .unwrap();
        assert_eq!(link, format!("https://party.example/join/{game_id}"));
    }

    #[test]
    fn join_link_falls_back_to_request_origin() {
        let game_id = Uuid::new_v4();
        let config = AppConfig::default();

        let link = config
            .join_link(Some("http://localhost:8080"), game_id)
            .unwrap();
        assert_eq!(link, format!("http://localhost:8080/join/{game_id}"));
        assert!(config.join_link(None, game_id).is_none());
    }
}
