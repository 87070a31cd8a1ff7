//! Named wait profiles with layered precedence
//!
//! Profiles are resolved from the following sources (low to high):
//! 1. Built-in presets (the `WaitConfiguration` constants)
//! 2. Profile file (`~/.eventual/wait-profiles.yaml` or a custom directory)
//! 3. Environment variables (`EVENTUAL_*` prefix, default profile only)

use crate::config::wait_config::{TimeUnit, WaitConfiguration, WaitSettings};
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;

/// Environment variable overriding the default poll interval (milliseconds)
pub const ENV_POLL_INTERVAL_MS: &str = "EVENTUAL_POLL_INTERVAL_MS";

/// Environment variable overriding the default timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "EVENTUAL_TIMEOUT_MS";

/// Environment variable toggling jitter on the default profile
pub const ENV_JITTER: &str = "EVENTUAL_JITTER";

/// A set of named wait settings plus an optional default
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WaitProfiles {
    /// Settings used when no profile is named
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<WaitSettings>,

    /// Settings by profile name
    #[serde(default)]
    pub profiles: BTreeMap<String, WaitSettings>,
}

impl WaitProfiles {
    /// Profiles built from the named `WaitConfiguration` constants
    pub fn builtin() -> Self {
        let presets = [
            ("role-propagation", WaitConfiguration::ROLE_PROPAGATION),
            ("database-row", WaitConfiguration::DATABASE_ROW),
            ("queue-dequeue", WaitConfiguration::QUEUE_DEQUEUE),
            ("input-request", WaitConfiguration::INPUT_REQUEST),
            ("build-completion", WaitConfiguration::BUILD_COMPLETION),
            ("service-ready", WaitConfiguration::SERVICE_READY),
        ];

        Self {
            default: Some(WaitSettings::from(&WaitConfiguration::DEFAULT)),
            profiles: presets
                .iter()
                .map(|(name, config)| ((*name).to_string(), WaitSettings::from(config)))
                .collect(),
        }
    }

    /// Parse profiles from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Parse profiles from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Validated default configuration
    pub fn default_configuration(&self) -> Result<WaitConfiguration> {
        match &self.default {
            Some(settings) => WaitConfiguration::try_from(settings),
            None => Ok(WaitConfiguration::DEFAULT),
        }
    }

    /// Validated configuration for `name`
    ///
    /// The name `default` resolves to [`WaitProfiles::default_configuration`].
    pub fn get(&self, name: &str) -> Result<WaitConfiguration> {
        if let Some(settings) = self.profiles.get(name) {
            return WaitConfiguration::try_from(settings);
        }

        if name == "default" {
            return self.default_configuration();
        }

        Err(Error::unknown_profile(name))
    }

    /// Profile names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    /// Merge `overlay` over `self`; overlay entries win
    pub fn merge(mut self, overlay: WaitProfiles) -> WaitProfiles {
        for (name, settings) in overlay.profiles {
            self.profiles.insert(name, settings);
        }

        if overlay.default.is_some() {
            self.default = overlay.default;
        }

        self
    }
}

/// Loads [`WaitProfiles`] from built-ins, a profile file and the environment
pub struct ProfileLoader {
    /// Directory holding the profile file
    config_dir: Utf8PathBuf,
}

impl ProfileLoader {
    /// File name looked up inside the config directory
    pub const FILE_NAME: &'static str = "wait-profiles.yaml";

    /// Create a loader rooted at `~/.eventual`
    pub fn new() -> Result<Self> {
        let config_dir = Self::default_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Resolve `~/.eventual`, preferring `HOME` over the platform lookup
    fn default_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .ok()
            .map(std::path::PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| Error::invalid_configuration("Could not determine home directory"))?;

        let home = Utf8PathBuf::from_path_buf(home).map_err(|path| {
            Error::invalid_configuration(format!(
                "Home directory is not valid UTF-8: {}",
                path.display()
            ))
        })?;

        Ok(home.join(".eventual"))
    }

    /// Load profiles with layered precedence
    ///
    /// A missing profile file is not an error; the built-ins are used.
    pub fn load(&self) -> Result<WaitProfiles> {
        let mut profiles = WaitProfiles::builtin();

        let path = self.profile_path();
        if path.exists() {
            tracing::debug!(path = %path, "loading wait profiles");
            let file_profiles = Self::load_yaml_file(&path)?;
            profiles = profiles.merge(file_profiles);
        }

        Self::apply_env_overrides(profiles)
    }

    /// Load profiles from an explicit file, without built-ins or env overrides
    pub fn load_file(path: &Utf8Path) -> Result<WaitProfiles> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        Self::load_yaml_file(path)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<WaitProfiles> {
        let content = fs::read_to_string(path)?;
        let profiles: WaitProfiles = serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::invalid_configuration(format!("Failed to parse {}: {}", path, e))
        })?;
        Ok(profiles)
    }

    /// Apply `EVENTUAL_*` overrides to the default profile
    fn apply_env_overrides(mut profiles: WaitProfiles) -> Result<WaitProfiles> {
        let mut settings = profiles
            .default
            .take()
            .unwrap_or_else(|| WaitSettings::from(&WaitConfiguration::DEFAULT));
        let mut overridden = false;

        if let Ok(val) = env::var(ENV_POLL_INTERVAL_MS) {
            settings.poll_interval = val.parse().map_err(|_| {
                Error::invalid_configuration(format!("{} must be a valid number", ENV_POLL_INTERVAL_MS))
            })?;
            settings.poll_interval_unit = TimeUnit::Milliseconds;
            overridden = true;
        }

        if let Ok(val) = env::var(ENV_TIMEOUT_MS) {
            settings.wait_timeout = val.parse().map_err(|_| {
                Error::invalid_configuration(format!("{} must be a valid number", ENV_TIMEOUT_MS))
            })?;
            settings.wait_timeout_unit = TimeUnit::Milliseconds;
            overridden = true;
        }

        if let Ok(val) = env::var(ENV_JITTER) {
            settings.jitter = parse_flag(&val).ok_or_else(|| {
                Error::invalid_configuration(format!("{} must be true or false", ENV_JITTER))
            })?;
            overridden = true;
        }

        if overridden {
            tracing::debug!(
                poll_interval = settings.poll_interval,
                poll_interval_unit = %settings.poll_interval_unit,
                wait_timeout = settings.wait_timeout,
                wait_timeout_unit = %settings.wait_timeout_unit,
                "default wait profile overridden from environment"
            );
        }

        profiles.default = Some(settings);
        Ok(profiles)
    }

    /// Path of the profile file
    pub fn profile_path(&self) -> Utf8PathBuf {
        self.config_dir.join(Self::FILE_NAME)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
