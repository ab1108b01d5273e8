use colored::Colorize;
use log::{error, info, warn};
use prettytable::{cell, row};
use sbg_client::DEFAULT_ENDPOINT;
use std::path::Path;
use structopt::StructOpt;
use url::Url;

use crate::{
    config::{self, CavaticaConfig, ProfileConfig},
    printer::new_table,
    utils,
};
use anyhow::Result;

#[derive(Debug, StructOpt)]
pub enum ConfigArgs {
    #[structopt(name = "add")]
    /// Add a new profile, or change an existing one
    AddProfile {
        #[structopt(long = "name", short = "n")]
        /// The name of the profile that will be created or updated
        name: Option<String>,

        #[structopt(long = "endpoint", short = "e")]
        /// The API endpoint that will be used for this profile
        endpoint: Option<Url>,

        #[structopt(long = "token", short = "t")]
        /// The API token that will be used for this profile
        token: Option<String>,

        #[structopt(long = "accept-invalid-certificates", short = "k")]
        /// Whether to accept invalid TLS certificates
        accept_invalid_certificates: bool,

        #[structopt(long = "proxy")]
        /// URL for an HTTP proxy that will be used for all requests if specified
        proxy: Option<Option<Url>>,
    },

    #[structopt(name = "current")]
    /// Display the default profile
    CurrentProfile,

    #[structopt(name = "delete")]
    /// Delete the specified profiles
    DeleteProfile {
        /// The name(s) of the profile(s) which will be deleted
        names: Vec<String>,
    },

    #[structopt(name = "ls")]
    /// List available profiles
    ListProfiles {
        #[structopt(long = "tokens")]
        /// Show API tokens (by default tokens are hidden).
        tokens: bool,
    },

    #[structopt(name = "use")]
    /// Set the default profile
    UseProfile {
        /// The name of the profile.
        name: String,
    },
}

pub fn run(
    args: &ConfigArgs,
    mut config: CavaticaConfig,
    config_path: impl AsRef<Path>,
) -> Result<CavaticaConfig> {
    match args {
        ConfigArgs::ListProfiles { tokens } if config.num_profiles() > 0 => {
            let mut profiles = config.get_all_profiles().clone();
            profiles.sort_unstable_by(|lhs, rhs| lhs.name.cmp(&rhs.name));
            let mut table = new_table();
            table.set_titles(
                row![bFg => "Default", "Profile", "Endpoint", "Insecure", "Token", "Proxy"],
            );
            for profile in profiles.iter() {
                let is_default = config.default_profile_name() == Some(profile.name.as_str());
                table.add_row(row![
                    if is_default { "    ->" } else { "" },
                    if is_default {
                        profile.name.bold().bright_white()
                    } else {
                        profile.name.normal()
                    },
                    profile.endpoint,
                    if profile.accept_invalid_certificates {
                        "Yes"
                    } else {
                        "No"
                    },
                    match (&profile.token, *tokens) {
                        (Some(token), true) => token.clone(),
                        (Some(_), false) => "<Hidden>".to_owned(),
                        (None, _) => String::new(),
                    },
                    profile
                        .proxy
                        .as_ref()
                        .map(Url::to_string)
                        .unwrap_or_default()
                ]);
            }
            table.printstd();
        }
        ConfigArgs::ListProfiles { .. } => {
            info!("No available profiles.");
        }
        ConfigArgs::AddProfile {
            name,
            endpoint,
            token,
            accept_invalid_certificates,
            proxy,
        } => {
            config = add_or_edit_profile(
                name,
                token,
                endpoint,
                *accept_invalid_certificates,
                proxy,
                config,
                config_path,
            )?;
        }
        ConfigArgs::UseProfile { name } => {
            if !config.set_default_profile(name) {
                error!(
                    "No such profile `{}` exists in `{}`.",
                    name,
                    config_path.as_ref().display()
                );
            } else {
                config::write_cavatica_config(config_path, &config)?;
                info!("Switched to profile `{}`.", name);
            }
        }
        ConfigArgs::CurrentProfile => match config.default_profile_name() {
            Some(name) => println!("{name}"),
            None => info!(
                "There is no default profile, `{}` is used.",
                config::FALLBACK_PROFILE
            ),
        },
        ConfigArgs::DeleteProfile { names } => {
            for name in names {
                if config.delete_profile(name) {
                    config::write_cavatica_config(&config_path, &config)?;
                    info!(
                        "Deleted profile `{}` from `{}`.",
                        name,
                        config_path.as_ref().display()
                    );
                } else {
                    error!(
                        "No such profile `{}` exists in `{}`.",
                        name,
                        config_path.as_ref().display()
                    );
                }
            }
        }
    }
    Ok(config)
}

fn add_or_edit_profile(
    name: &Option<String>,
    token: &Option<String>,
    endpoint: &Option<Url>,
    accept_invalid_certificates: bool,
    proxy: &Option<Option<Url>>,
    mut config: CavaticaConfig,
    config_path: impl AsRef<Path>,
) -> Result<CavaticaConfig> {
    let name = loop {
        let name = match name {
            None => utils::read_from_stdin("Profile name", Some(config::FALLBACK_PROFILE))?,
            Some(name) => name.clone(),
        };
        if !name.is_empty() {
            break name;
        } else {
            error!("Profile name cannot be empty.");
        }
    };

    let existing_profile = config.get_profile(&name).cloned();
    if existing_profile.is_some() {
        info!("Profile `{}` already exists, it will be modified.", name);
    } else {
        info!("A new profile `{}` will be created.", name);
    }

    let token = match token {
        None => utils::read_token_from_stdin()?
            .or_else(|| existing_profile.as_ref().and_then(|profile| profile.token.clone())),
        token => token.clone(),
    };
    if token.is_none() {
        info!(concat!(
            "No API token was associated with the profile. ",
            "You will have to pass --token with every command."
        ));
    } else {
        warn!(
            "Be careful, API tokens are stored in cleartext in {}.",
            config_path.as_ref().display()
        );
    }

    let endpoint = match endpoint {
        None => loop {
            match Url::parse(&utils::read_from_stdin(
                "Endpoint",
                Some(
                    existing_profile
                        .as_ref()
                        .map(|profile| profile.endpoint.as_str())
                        .unwrap_or_else(|| DEFAULT_ENDPOINT.as_str()),
                ),
            )?) {
                Ok(url) => break url,
                Err(error) => {
                    error!("Invalid endpoint URL: {}", error);
                }
            }
        },
        Some(endpoint) => endpoint.clone(),
    };

    let profile = ProfileConfig {
        name: name.clone(),
        endpoint,
        token,
        accept_invalid_certificates,
        proxy: proxy.clone().unwrap_or_else(|| {
            existing_profile
                .as_ref()
                .and_then(|profile| profile.proxy.clone())
        }),
    };

    let is_new_profile = !config.set_profile(profile);
    if is_new_profile && config.num_profiles() == 1 {
        info!("Default profile set to `{}`.", name);
        config.set_default_profile(&name);
    }

    config::write_cavatica_config(config_path, &config)?;

    if is_new_profile {
        info!("New profile `{}` was created.", name);
    } else {
        info!("Profile `{}` was updated.", name);
    }

    Ok(config)
}
