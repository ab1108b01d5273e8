use crate::{
    commands::{
        config::ConfigArgs, copy::CopyArgs, create::CreateArgs, delete::DeleteArgs,
        export::ExportArgs, find::FindArgs, get::GetArgs, report::ReportArgs, run::RunArgs,
        update::UpdateArgs,
    },
    printer::OutputFormat,
};
use anyhow::{anyhow, Error, Result};
use sbg_client::DEFAULT_PAGE_SIZE;
use std::{path::PathBuf, str::FromStr};
use structopt::StructOpt;
use url::Url;

/// cav runs and tidies up workflows on Cavatica and other Seven Bridges platforms.
///
/// Commands which change anything on the platform only report what they would do, unless
/// `--run` is passed.
#[derive(Debug, StructOpt)]
#[structopt(
    global_settings = &[
        structopt::clap::AppSettings::ColoredHelp,
        structopt::clap::AppSettings::InferSubcommands,
    ]
)]
pub struct Args {
    #[structopt(long = "config-file", parse(from_os_str))]
    /// Path to the profiles file. Typically defaults to ~/.config/cavatica/profiles.json on Linux.
    pub config: Option<PathBuf>,

    #[structopt(short = "p", long = "profile")]
    /// Profile to use. Overrides the default profile, if any.
    pub profile: Option<String>,

    #[structopt(short = "v", long = "verbose")]
    /// Enable more verbose logging.
    pub verbose: bool,

    #[structopt(long = "endpoint", parse(try_from_str))]
    /// API endpoint to use. Overrides the one from the profile, if any.
    pub endpoint: Option<Url>,

    #[structopt(short = "k", long = "accept-invalid-certificates", parse(try_from_str))]
    /// Whether to accept invalid TLS certificates. Overrides the profile setting.
    pub accept_invalid_certificates: Option<bool>,

    #[structopt(long = "token")]
    /// API token to use. Overrides the one from the profile, if any.
    pub token: Option<String>,

    #[structopt(long = "proxy")]
    /// URL of an HTTP proxy for all requests. Overrides the one from the profile, if any.
    pub proxy: Option<Url>,

    #[structopt(short = "o", long = "output", default_value = "table")]
    /// Output format. One of: table, json
    pub output: OutputFormat,

    #[structopt(long = "page-size", default_value = "50")]
    /// Number of items to request per page when listing
    pub page_size: usize,

    #[structopt(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size
        }
    }
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(name = "completion")]
    /// Output shell completion code for the specified shell (bash or zsh)
    Completion { shell: Shell },

    #[structopt(name = "config")]
    /// Manage profiles: API endpoints and tokens
    Config {
        #[structopt(subcommand)]
        config_args: ConfigArgs,
    },

    #[structopt(name = "find")]
    /// Look up files, tasks and logs
    Find {
        #[structopt(subcommand)]
        find_args: FindArgs,
    },

    #[structopt(name = "get")]
    /// Display billing information, task outputs and workflow inputs
    Get {
        #[structopt(subcommand)]
        get_args: GetArgs,
    },

    #[structopt(name = "create")]
    /// Create draft tasks and projects
    Create {
        #[structopt(subcommand)]
        create_args: CreateArgs,
    },

    #[structopt(name = "run")]
    /// Launch draft tasks
    Run {
        #[structopt(subcommand)]
        run_args: RunArgs,
    },

    #[structopt(name = "delete")]
    /// Delete tasks and files
    Delete {
        #[structopt(subcommand)]
        delete_args: DeleteArgs,
    },

    #[structopt(name = "export")]
    /// Export files to a cloud storage volume
    Export {
        #[structopt(subcommand)]
        export_args: ExportArgs,
    },

    #[structopt(name = "copy")]
    /// Copy files between projects
    Copy {
        #[structopt(subcommand)]
        copy_args: CopyArgs,
    },

    #[structopt(name = "update")]
    /// Rename files and set their metadata
    Update {
        #[structopt(subcommand)]
        update_args: UpdateArgs,
    },

    #[structopt(name = "report")]
    /// Summarise projects and task costs
    Report {
        #[structopt(subcommand)]
        report_args: ReportArgs,
    },
}

#[derive(Debug)]
pub enum Shell {
    Bash,
    Zsh,
}

impl FromStr for Shell {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        match string {
            "bash" => Ok(Shell::Bash),
            "zsh" => Ok(Shell::Zsh),
            _ => Err(anyhow!("unknown shell: '{}'", string)),
        }
    }
}
