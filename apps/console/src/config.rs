use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Local emulator defaults. The emulator ships with a single well-known
/// master key, so running the demos against it needs no settings file.
pub const EMULATOR_ENDPOINT: &str = "https://localhost:8081";
pub const EMULATOR_MASTER_KEY: &str =
    "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";

const ENV_ENDPOINT: &str = "DOCSTORE_ENDPOINT";
const ENV_MASTER_KEY: &str = "DOCSTORE_MASTER_KEY";

#[derive(Debug, Clone)]
pub struct Settings {
    pub endpoint: String,
    pub master_key: String,
}

/// Optional settings file; every field may be omitted.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    endpoint: Option<String>,
    master_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: EMULATOR_ENDPOINT.to_string(),
            master_key: EMULATOR_MASTER_KEY.to_string(),
        }
    }
}

impl Settings {
    /// Defaults, overridden by the settings file when present, overridden in
    /// turn by environment variables.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::default();

        if path.exists() {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading settings file {}", path.display()))?;
            let file: SettingsFile = toml::from_str(&text)
                .with_context(|| format!("parsing settings file {}", path.display()))?;
            settings.apply(file);
        }

        settings.apply(SettingsFile {
            endpoint: env::var(ENV_ENDPOINT).ok(),
            master_key: env::var(ENV_MASTER_KEY).ok(),
        });

        Ok(settings)
    }

    fn apply(&mut self, file: SettingsFile) {
        if let Some(endpoint) = file.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(master_key) = file.master_key {
            self.master_key = master_key;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_emulator() {
        let settings = Settings::default();
        assert_eq!(settings.endpoint, EMULATOR_ENDPOINT);
        assert_eq!(settings.master_key, EMULATOR_MASTER_KEY);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(settings.endpoint, EMULATOR_ENDPOINT);
    }

    #[test]
    fn file_fields_override_defaults_individually() {
        let file: SettingsFile =
            toml::from_str(r#"endpoint = "https://example.documents.net""#).unwrap();
        let mut settings = Settings::default();
        settings.apply(file);
        assert_eq!(settings.endpoint, "https://example.documents.net");
        assert_eq!(settings.master_key, EMULATOR_MASTER_KEY);
    }
}
