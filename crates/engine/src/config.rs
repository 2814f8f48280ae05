//! Flat JSON configuration. A missing file is answered with a freshly
//! written template and a setup error, so the first run is self-documenting.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use categorizer::Category;

use crate::error::EngineError;
use crate::Result;

const GIB: u64 = 1 << 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// The directory the daemon seeds from. Required, absolute.
    pub seed_dir: PathBuf,
    /// Directory the daemon watches for new `.torrent` files. Empty
    /// disables watch-dir cleanup.
    pub watch_dir: PathBuf,
    pub rpc_url: String,
    pub rpc_port: u16,
    pub rpc_path: String,
    pub rpc_username: String,
    pub rpc_password: String,
    /// Seed-space quota in GiB; 0 disables eviction.
    pub quota_gib: u64,
    pub destinations: Destinations,
    /// File holding the adult-content pattern, one line.
    pub regex_file: PathBuf,
    /// Optional external classifier program; empty runs the built-in one.
    pub categorizer_program: PathBuf,
    /// Activity log. Empty places `activity.log` beside the config file.
    pub log_file: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Destinations {
    pub default: PathBuf,
    pub movies: PathBuf,
    pub tv_shows: PathBuf,
    pub music: PathBuf,
    pub av: PathBuf,
}

impl Destinations {
    /// The destination root for a category, falling back to `default` for
    /// categories without a configured path.
    pub fn for_category(&self, category: Category) -> &Path {
        let path = match category {
            Category::Default => &self.default,
            Category::Film => &self.movies,
            Category::Tv => &self.tv_shows,
            Category::Music => &self.music,
            Category::Av => &self.av,
        };
        if path.as_os_str().is_empty() {
            &self.default
        } else {
            path
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_dir: PathBuf::new(),
            watch_dir: PathBuf::new(),
            rpc_url: "http://127.0.0.1".to_owned(),
            rpc_port: 9091,
            rpc_path: "/transmission/rpc".to_owned(),
            rpc_username: String::new(),
            rpc_password: String::new(),
            quota_gib: 0,
            destinations: Destinations::default(),
            regex_file: PathBuf::new(),
            categorizer_program: PathBuf::new(),
            log_file: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load and validate the configuration. When the file does not exist, a
    /// blank template is written in its place and a setup error is returned.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Self::write_template(path)?;
                return Err(EngineError::Setup(format!(
                    "a blank configuration file has been created at \"{}\"; \
                     edit the settings before running again",
                    path.display()
                )));
            }
            Err(err) => {
                return Err(EngineError::Setup(format!(
                    "cannot read configuration {}: {err}",
                    path.display()
                )))
            }
        };

        let mut config: Config = serde_json::from_str(&text)
            .map_err(|err| EngineError::Setup(format!("invalid configuration: {err}")))?;
        if config.log_file.as_os_str().is_empty() {
            config.log_file = path.with_file_name("activity.log");
        }
        config.validate()?;
        Ok(config)
    }

    fn write_template(path: &Path) -> Result<()> {
        let template = serde_json::to_string_pretty(&Config::default())
            .expect("default config serializes");
        std::fs::write(path, template).map_err(|err| EngineError::io(path, err))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.seed_dir.is_absolute() {
            return Err(EngineError::Setup(
                "seed-dir must be an absolute path".to_owned(),
            ));
        }
        if !self.watch_dir.as_os_str().is_empty() && !self.watch_dir.is_absolute() {
            return Err(EngineError::Setup(
                "watch-dir must be an absolute path".to_owned(),
            ));
        }
        if !self.destinations.default.is_absolute() {
            return Err(EngineError::Setup(
                "destinations.default must be an absolute path".to_owned(),
            ));
        }
        if self.regex_file.as_os_str().is_empty() {
            return Err(EngineError::Setup("regex-file is not set".to_owned()));
        }
        Ok(())
    }

    /// The full RPC endpoint URL.
    pub fn endpoint(&self) -> String {
        format!("{}:{}{}", self.rpc_url, self.rpc_port, self.rpc_path)
    }

    pub fn quota_bytes(&self) -> u64 {
        self.quota_gib * GIB
    }

    pub fn watch_dir(&self) -> Option<&Path> {
        if self.watch_dir.as_os_str().is_empty() {
            None
        } else {
            Some(&self.watch_dir)
        }
    }

    pub fn rpc_username(&self) -> Option<String> {
        if self.rpc_username.is_empty() {
            None
        } else {
            Some(self.rpc_username.clone())
        }
    }

    pub fn rpc_password(&self) -> Option<String> {
        if self.rpc_password.is_empty() {
            None
        } else {
            Some(self.rpc_password.clone())
        }
    }
}
