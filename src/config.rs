// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::fs::write;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Parameters;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scheduler: Parameters,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// Accepted as `Authorization: Bearer <token>`. No token means only
    /// session cookies are accepted.
    pub api_token: Option<String>,
    /// The key sessions are signed with. Changing it logs everyone out.
    pub session_secret: String,
    pub session_max_age_days: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password".to_string(),
            api_token: Some("your-api-token-here".to_string()),
            session_secret: Uuid::new_v4().simple().to_string(),
            session_max_age_days: 7,
        }
    }
}

impl Config {
    /// Load `config.toml` from the data directory. If there is none, write
    /// the defaults there first.
    pub fn load_or_create(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        let config = if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
            let content = read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            config
        } else {
            log::warn!(
                "No configuration found, writing defaults to {}. Change the credentials before exposing the server.",
                path.display()
            );
            let config = Config::default();
            write(&path, toml::to_string_pretty(&config)?)?;
            config
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.auth.username.trim().is_empty() {
            return fail("auth.username must not be empty.");
        }
        if self.auth.session_secret.is_empty() {
            return fail("auth.session_secret must not be empty.");
        }
        if self.auth.session_max_age_days == 0 {
            return fail("auth.session_max_age_days must be at least one day.");
        }
        self.scheduler.validate()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::scheduler::Step;

    #[test]
    fn test_default_written_and_reloaded() -> Fallible<()> {
        let dir = tempdir()?;
        let first = Config::load_or_create(dir.path())?;
        assert!(dir.path().join(CONFIG_FILE).exists());
        assert_eq!(first.auth.username, "admin");
        let second = Config::load_or_create(dir.path())?;
        assert_eq!(first.auth.session_secret, second.auth.session_secret);
        assert_eq!(second.scheduler, Parameters::default());
        Ok(())
    }

    #[test]
    fn test_partial_config() -> Fallible<()> {
        let dir = tempdir()?;
        let content = r#"
[auth]
username = "ana"
password = "hunter2"
session_secret = "s3cret"

[scheduler]
desired_retention = 0.85
learning_steps = ["30s", "5m", "1h"]
relearning_steps = []
enable_fuzz = true
"#;
        write(dir.path().join(CONFIG_FILE), content)?;
        let config = Config::load_or_create(dir.path())?;
        assert_eq!(config.auth.username, "ana");
        assert_eq!(config.auth.api_token.as_deref(), Some("your-api-token-here"));
        assert_eq!(config.auth.session_max_age_days, 7);
        assert_eq!(config.scheduler.desired_retention, 0.85);
        assert_eq!(config.scheduler.learning_steps.len(), 3);
        assert_eq!(config.scheduler.learning_steps[2], Step::minutes(60));
        assert!(config.scheduler.relearning_steps.is_empty());
        assert!(config.scheduler.enable_fuzz);
        assert_eq!(config.scheduler.maximum_interval, 36500);
        Ok(())
    }

    #[test]
    fn test_invalid_config() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[scheduler]\ndesired_retention = 1.5\n",
        )?;
        assert!(Config::load_or_create(dir.path()).is_err());
        write(
            dir.path().join(CONFIG_FILE),
            "[scheduler]\nlearning_steps = [\"10x\"]\n",
        )?;
        assert!(Config::load_or_create(dir.path()).is_err());
        Ok(())
    }
}
