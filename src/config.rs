use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the USDA NASS Quick Stats API key
pub const NASS_API_KEY_VAR: &str = "NASS_API_KEY";

#[derive(Clone, Default)]
pub struct Config {
    pub nass_api_key: Option<String>,
}

// Keep the key out of logs
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "nass_api_key",
                &self.nass_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Config {
    /// `.env` at the project root, regardless of the working directory
    pub fn default_env_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(".env")
    }

    /// Load from the project root `.env` plus the process environment
    pub fn from_env() -> Self {
        Self::from_env_file(Self::default_env_path())
    }

    /// Load `path` into the process environment if it exists, then read the config
    ///
    /// Variables already set in the process win over the file. A missing file or
    /// missing key is not an error: the key is simply `None`.
    pub fn from_env_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match dotenvy::from_path(path) {
            Ok(()) => debug!("Loaded environment from {}", path.display()),
            Err(e) => debug!("No environment loaded from {}: {}", path.display(), e),
        }

        Config {
            nass_api_key: env::var(NASS_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn has_nass_api_key(&self) -> bool {
        self.nass_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_env_path_is_project_root() {
        let path = Config::default_env_path();
        assert!(path.ends_with(".env"));
        assert_eq!(path.parent(), Some(Path::new(env!("CARGO_MANIFEST_DIR"))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Config {
            nass_api_key: Some("secret-key".to_string()),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
