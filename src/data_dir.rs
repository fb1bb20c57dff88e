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

use std::env;
use std::fs::create_dir_all;
use std::path::PathBuf;

use crate::config::Config;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// Overrides the default data directory when no directory is given.
pub const DATA_DIR_VAR: &str = "APP_DATA_DIR";

const DB_FILE: &str = "flashsched.db";

/// An opened data directory: the configuration and the card store.
pub struct DataDir {
    pub directory: PathBuf,
    pub config: Config,
    pub db: Database,
}

impl DataDir {
    /// Open the data directory, creating it if it does not exist.
    pub fn open(directory: Option<String>) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => match env::var(DATA_DIR_VAR) {
                Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => PathBuf::from("./data"),
            },
        };
        if !directory.exists() {
            log::debug!("Creating data directory {}", directory.display());
            create_dir_all(&directory)?;
        }
        let directory = directory.canonicalize()?;
        if !directory.is_dir() {
            return Err(ErrorReport::new(format!(
                "{} is not a directory.",
                directory.display()
            )));
        }

        let config = Config::load_or_create(&directory)?;

        let db_path: PathBuf = directory.join(DB_FILE);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let db = Database::new(db_path)?;

        Ok(Self {
            directory,
            config,
            db,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::config::CONFIG_FILE;

    #[test]
    fn test_open_creates_directory() -> Fallible<()> {
        let root = tempdir()?;
        let path = root.path().join("nested").join("data");
        let data = DataDir::open(Some(path.display().to_string()))?;
        assert!(data.directory.join(CONFIG_FILE).exists());
        assert!(data.directory.join(DB_FILE).exists());
        assert!(data.db.cards(None)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_open_rejects_file() -> Fallible<()> {
        let root = tempdir()?;
        let path = root.path().join("file");
        std::fs::write(&path, "")?;
        assert!(DataDir::open(Some(path.display().to_string())).is_err());
        Ok(())
    }
}
