#![deny(clippy::all)]
mod args;
mod commands;
mod config;
mod errors;
mod printer;
mod progress;
mod thousands;
mod utils;

use anyhow::{Context, Result};
use log::{error, warn};
use sbg_client::{retry::RetryConfig, Client, Config as ClientConfig, Token};
use std::{
    fs, io,
    path::{Path, PathBuf},
    process,
};
use structopt::{clap::Shell as ClapShell, StructOpt};

use crate::{
    args::{Args, Command, Shell},
    commands::{
        config as config_command, copy, create, delete, export, find,
        get::{self, GetArgs},
        report, run as run_command, update,
    },
    config::CavaticaConfig,
    errors::ConfigError,
    printer::Printer,
    utils::io::init_env_logger,
};

fn run(args: Args) -> Result<()> {
    let config_path = find_configuration(&args)?;
    let cli_config = config::read_cavatica_config(&config_path)?;
    let printer = Printer::new(args.output);
    let page_size = args.page_size();
    let client = || client_from_args(&args, &cli_config, &config_path);

    match &args.command {
        Command::Config { config_args } => {
            config_command::run(config_args, cli_config.clone(), &config_path).map(|_| ())
        }
        Command::Completion { shell } => {
            let mut app = Args::clap();
            let clap_shell = match shell {
                Shell::Zsh => ClapShell::Zsh,
                Shell::Bash => ClapShell::Bash,
            };
            app.gen_completions_to("cav", clap_shell, &mut io::stdout());
            Ok(())
        }
        // Reading a workflow needs no connection.
        Command::Get {
            get_args: GetArgs::WorkflowInputs(workflow_args),
        } => get::workflow_inputs(workflow_args, &printer),
        Command::Get { get_args } => get::run(get_args, &client()?, &printer, page_size),
        Command::Find { find_args } => find::run(find_args, &client()?, &printer, page_size),
        Command::Create { create_args } => {
            create::run(create_args, &client()?, &printer, page_size)
        }
        Command::Run { run_args } => run_command::run(run_args, &client()?, &printer),
        Command::Delete { delete_args } => delete::run(delete_args, &client()?, page_size),
        Command::Export { export_args } => export::run(export_args, &client()?, page_size),
        Command::Copy { copy_args } => copy::run(copy_args, &client()?, &printer),
        Command::Update { update_args } => update::run(update_args, &client()?, page_size),
        Command::Report { report_args } => {
            report::run(report_args, &client()?, &printer, page_size)
        }
    }
}

/// Build a client from the selected profile, with command line flags taking precedence.
fn client_from_args(args: &Args, config: &CavaticaConfig, config_path: &Path) -> Result<Client> {
    let profile_name = config.select_profile_name(args.profile.as_deref());
    let profile = config.get_profile(profile_name);
    let unknown_profile = || ConfigError::UnknownProfile {
        profile: profile_name.to_owned(),
        path: config_path.to_path_buf(),
    };

    let endpoint = match (&args.endpoint, profile) {
        (Some(endpoint), _) => endpoint.clone(),
        (None, Some(profile)) => profile.endpoint.clone(),
        (None, None) => return Err(unknown_profile().into()),
    };

    let token = match (&args.token, profile) {
        (Some(token), _) => token.clone(),
        (None, Some(profile)) => profile.token.clone().ok_or_else(|| ConfigError::MissingToken {
            profile: profile_name.to_owned(),
        })?,
        (None, None) => return Err(unknown_profile().into()),
    };

    let accept_invalid_certificates = args
        .accept_invalid_certificates
        .or_else(|| profile.map(|profile| profile.accept_invalid_certificates))
        .unwrap_or(false);
    if accept_invalid_certificates {
        warn!(concat!(
            "TLS certificate verification is disabled. ",
            "Do NOT use this over an insecure network."
        ));
    }

    Client::new(ClientConfig {
        endpoint,
        token: Token(token),
        accept_invalid_certificates,
        proxy: args
            .proxy
            .clone()
            .or_else(|| profile.and_then(|profile| profile.proxy.clone())),
        retry_config: Some(RetryConfig::default()),
    })
    .context("Failed to initialise the HTTP client.")
}

fn find_configuration(args: &Args) -> Result<PathBuf> {
    let config_path = if let Some(config_path) = args.config.clone() {
        if !config_path.exists() {
            warn!(
                "Configuration file `{}` doesn't exist.",
                config_path.display()
            );
        }
        config_path
    } else {
        let mut config_path =
            dirs::config_dir().context("Could not get path to the user's config directory")?;
        config_path.push("cavatica");
        fs::create_dir_all(&config_path).with_context(|| {
            format!(
                "Could not create config directory {}",
                config_path.display()
            )
        })?;
        config_path.push("profiles.json");
        config_path
    };
    Ok(config_path)
}

fn main() {
    let args = Args::from_args();
    init_env_logger(args.verbose);

    if let Err(error) = run(args) {
        error!("An error occurred:");
        for cause in error.chain() {
            error!(" |- {cause}");
        }

        #[cfg(feature = "backtrace")]
        {
            error!("{}", error.backtrace());
        }

        process::exit(1);
    }
}
