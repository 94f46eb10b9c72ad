//! Settings file (`chamada.toml`). Every field is optional.
//!
//! ```toml
//! data_dir = "/var/lib/chamada"
//! directory = "efetivo.csv"
//! log_level = "debug"
//!
//! [[admins]]
//! username = "admin"
//! password = "123"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::directory::{Directory, default_admins};
use crate::error::Result;
use crate::model::AdminRecord;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Personnel CSV; the built-in list is used when unset.
    pub directory: Option<PathBuf>,
    pub log_level: String,
    pub admins: Vec<AdminRecord>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            directory: None,
            log_level: "info".to_string(),
            admins: default_admins(),
        }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_toml(&fs::read_to_string(path)?)
    }

    pub fn load_directory(&self) -> Result<Directory> {
        match &self.directory {
            Some(path) => Directory::from_csv(path),
            None => Ok(Directory::builtin()),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chamada")
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chamada")
        .join("chamada.toml")
}
