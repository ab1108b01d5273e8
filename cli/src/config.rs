use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};
use url::Url;

/// Profile used when neither `--profile` nor a default profile is given.
pub const FALLBACK_PROFILE: &str = "cavatica";

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct CavaticaConfig {
    #[serde(default)]
    default_profile: Option<String>,
    #[serde(default)]
    profiles: Vec<ProfileConfig>,
}

impl CavaticaConfig {
    pub fn get_all_profiles(&self) -> &Vec<ProfileConfig> {
        &self.profiles
    }

    pub fn get_profile(&self, name: &str) -> Option<&ProfileConfig> {
        self.profiles.iter().find(|profile| profile.name == name)
    }

    /// Insert or replace a profile, returning whether one with that name existed.
    pub fn set_profile(&mut self, profile: ProfileConfig) -> bool {
        if let Some(index) = self.profile_position(&profile.name) {
            self.profiles[index] = profile;
            true
        } else {
            self.profiles.push(profile);
            false
        }
    }

    pub fn delete_profile(&mut self, name: &str) -> bool {
        let Some(index) = self.profile_position(name) else {
            return false;
        };
        self.profiles.remove(index);
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        true
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.default_profile.as_deref()
    }

    pub fn set_default_profile(&mut self, name: &str) -> bool {
        if self.get_profile(name).is_some() {
            self.default_profile = Some(name.to_owned());
            true
        } else {
            false
        }
    }

    /// The profile to use: the one asked for, else the default, else [`FALLBACK_PROFILE`].
    pub fn select_profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or(FALLBACK_PROFILE)
    }

    pub fn num_profiles(&self) -> usize {
        self.profiles.len()
    }

    fn profile_position(&self, name: &str) -> Option<usize> {
        self.profiles.iter().position(|profile| profile.name == name)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ProfileConfig {
    pub name: String,
    pub endpoint: Url,
    pub token: Option<String>,
    #[serde(default)]
    pub accept_invalid_certificates: bool,
    #[serde(default)]
    pub proxy: Option<Url>,
}

pub fn read_cavatica_config(path: impl AsRef<Path>) -> Result<CavaticaConfig> {
    debug!("Reading profiles from `{}`", path.as_ref().display());
    if path.as_ref().exists() {
        let file = File::open(&path)
            .with_context(|| format!("Could not open config file `{}`", path.as_ref().display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Could not parse config file `{}`", path.as_ref().display()))
    } else {
        Ok(Default::default())
    }
}

pub fn write_cavatica_config(path: impl AsRef<Path>, config: &CavaticaConfig) -> Result<()> {
    debug!("Writing profiles to `{}`", path.as_ref().display());
    let file = File::create(&path)
        .with_context(|| format!("Could not create config file `{}`", path.as_ref().display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &config).with_context(|| {
        format!(
            "Could not serialise configuration to `{}`",
            path.as_ref().display()
        )
    })
}
