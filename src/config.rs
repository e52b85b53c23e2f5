// This file is part of the terraform-provider-account project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
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

//! Client configuration.
//!
//! Values are layered, from lowest to highest precedence: top-level keys of
//! the config file, the selected context of the config file, environment
//! variables, and finally the attributes of the `provider` block.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_API_URI: &str = "https://api.ukfast.io/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

const CONFIG_PATH_ENV: &str = "ANS_CONFIG";
const CONFIG_FILE_NAME: &str = ".ans.yml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("context [{0}] does not exist in the config file")]
    UnknownContext(String),
    #[error("no API key configured: set `api_key` in the provider block, the ANS_API_KEY environment variable, or the config file")]
    MissingApiKey,
}

/// Settings of a single context. Also used for the top-level defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_uri: Option<String>,
    #[serde(default)]
    pub api_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub api_debug: Option<bool>,
}

impl ContextConfig {
    fn overlay(&mut self, other: &ContextConfig) {
        if other.api_key.is_some() {
            self.api_key.clone_from(&other.api_key);
        }
        if other.api_uri.is_some() {
            self.api_uri.clone_from(&other.api_uri);
        }
        if other.api_timeout_seconds.is_some() {
            self.api_timeout_seconds = other.api_timeout_seconds;
        }
        if other.api_debug.is_some() {
            self.api_debug = other.api_debug;
        }
    }

    fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            api_key: var("ANS_API_KEY").or_else(|| var("UKF_API_KEY")),
            api_uri: var("ANS_API_URI"),
            api_timeout_seconds: var("ANS_API_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()),
            api_debug: var("ANS_API_DEBUG").map(|v| matches!(v.as_str(), "1" | "true" | "TRUE")),
        }
    }
}

/// Contents of the config file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub current_context: Option<String>,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextConfig>,
    #[serde(flatten)]
    pub defaults: ContextConfig,
}

/// Fully resolved settings used to build the API client.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_uri: String,
    pub timeout: Duration,
    pub debug: bool,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("api_uri", &self.api_uri)
            .field("timeout", &self.timeout)
            .field("debug", &self.debug)
            .finish()
    }
}

impl Config {
    /// Location of the config file: `$ANS_CONFIG`, or `~/.ans.yml`.
    pub fn default_path() -> Option<PathBuf> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
            _ => dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME)),
        }
    }

    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// A missing file yields an empty config.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolve the client settings.
    ///
    /// `context` switches the current context and must exist in the file.
    /// `api_key` overrides whatever key the other layers provide.
    pub fn resolve(
        &self,
        context: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<ClientConfig, ConfigError> {
        let mut settings = self.defaults.clone();

        let context = context.filter(|name| !name.is_empty());
        if let Some(name) = context.or(self.current_context.as_deref()) {
            match self.contexts.get(name) {
                Some(selected) => settings.overlay(selected),
                None => return Err(ConfigError::UnknownContext(name.to_owned())),
            }
        }

        settings.overlay(&ContextConfig::from_env());

        if let Some(api_key) = api_key.filter(|key| !key.is_empty()) {
            settings.api_key = Some(api_key.to_owned());
        }

        let api_key = settings.api_key.ok_or(ConfigError::MissingApiKey)?;

        Ok(ClientConfig {
            api_key,
            api_uri: settings
                .api_uri
                .unwrap_or_else(|| DEFAULT_API_URI.to_owned()),
            // 0 means unset
            timeout: settings
                .api_timeout_seconds
                .filter(|seconds| *seconds > 0)
                .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            debug: settings.api_debug.unwrap_or(false),
        })
    }
}
