//! Command-line interface of `wayne-deploy`.
//!
//! ```bash
//! # Resolve or create everything and publish deployment, service and ingress
//! wayne-deploy publish --namespace team-a --app-name svc-x --project-name api \
//!     --image registry/svc-x:1.0 --k8s-cluster-name prod
//!
//! # Refresh the cached token
//! wayne-deploy login
//! ```

mod error;
mod login;
mod publish;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use tokio::runtime::Runtime;
use wayne_client::Credentials;
use wayne_deploy_base::{CLI_PROGRAM_NAME, consts::env};

pub use self::error::Error;
use self::publish::PublishCommand;
use crate::{config::Config, shadow};

/// `Cli` is the entry point of the Wayne Deploy command line interface.
///
/// It parses the command-line arguments, loads the configuration and
/// dispatches to the selected subcommand.
#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Register and publish applications through the Wayne control plane",
    long_about = "Wayne Deploy makes sure the namespace, application and deployment, service \
                  and ingress records of a project exist on the Wayne control plane, then \
                  publishes the project's manifests to a cluster.",
    color = clap::ColorChoice::Always
)]
pub struct Cli {
    /// The subcommand to execute.
    #[clap(subcommand)]
    commands: Option<Commands>,

    /// Path to the configuration file.
    ///
    /// Defaults to `~/.config/wayne-deploy/config.yaml` or the path given by
    /// the `WAYNE_DEPLOY_CONFIG_FILE_PATH` environment variable. A missing
    /// default file is not an error; the built-in defaults are used instead.
    #[clap(
        long = "config",
        short = 'c',
        env = "WAYNE_DEPLOY_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/wayne-deploy/config.yaml or \
                WAYNE_DEPLOY_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    /// Overrides the log level from the configuration file.
    ///
    /// Supported levels include `error`, `warn`, `info`, `debug` and `trace`.
    #[clap(
        long = "log-level",
        env = "WAYNE_DEPLOY_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,

    /// Base URL of the control plane, such as `https://wayne.example.com`.
    ///
    /// Falls back to the `WAYNE_URL` environment variable.
    #[clap(long = "url", env = env::URL, global = true, help = "Base URL of the control plane")]
    url: Option<String>,

    /// User name for the LDAP login.
    ///
    /// Falls back to the `WAYNE_USERNAME` environment variable.
    #[clap(long = "username", env = env::USERNAME, global = true, help = "Login user name")]
    username: Option<String>,

    /// Password for the LDAP login.
    ///
    /// Falls back to the `WAYNE_PASSWORD` environment variable, whose value is
    /// never shown in the help output.
    #[clap(
        long = "password",
        env = env::PASSWORD,
        global = true,
        hide_env_values = true,
        help = "Login password"
    )]
    password: Option<String>,
}

/// `Commands` enumerates the subcommands of Wayne Deploy.
#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Displays version information, followed by the control plane URL when
    /// one is configured.
    #[command(about = "Display version information")]
    Version {
        /// If true, shows only the client version.
        #[clap(long = "client", help = "Show the client version only.")]
        client: bool,
    },

    /// Generates a shell completion script for the specified shell.
    ///
    /// # Arguments
    ///
    /// * `shell` - The shell for which to generate completions (e.g., `bash`,
    ///   `zsh`, `fish`).
    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    /// Outputs the default configuration in YAML format to standard output.
    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,

    /// Makes sure the namespace, application and records of a project exist,
    /// then publishes its deployment, service and ingress to a cluster.
    #[command(
        alias = "p",
        about = "Resolve or create the project's resources and publish its manifests"
    )]
    Publish(PublishCommand),

    /// Logs in to the control plane even when a token is cached, and writes
    /// the new token to the token cache.
    #[command(about = "Log in and replace the cached token")]
    Login,
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file and applies the `--log-level` override.
    ///
    /// An explicitly given file must exist; when none is given and no file is
    /// found at the default locations, the defaults are used.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match &self.config_file {
            Some(path) => Config::load(path)?,
            None => {
                let path = Config::search_config_file_path();
                if path.try_exists().unwrap_or(false) {
                    Config::load(path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Runs the selected subcommand and returns the process exit code.
    ///
    /// `version`, `completions` and `default-config` are answered without
    /// reading the configuration file or the credentials. Every other
    /// subcommand loads the configuration, installs the logger and runs on a
    /// new tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration or the credentials are
    /// unusable, the runtime cannot start, or the subcommand fails.
    ///
    /// # Panics
    ///
    /// Panics when writing to stdout fails.
    pub fn run(self) -> Result<i32, Error> {
        match self.commands {
            Some(Commands::Version { client }) => {
                std::io::stdout()
                    .write_all(Self::command().render_long_version().as_bytes())
                    .expect("Failed to write to stdout");
                if !client && let Some(url) = &self.url {
                    std::io::stdout()
                        .write_all(format!("Control Plane: {url}\n").as_bytes())
                        .expect("Failed to write to stdout");
                }
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut std::io::stdout());
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                std::io::stdout()
                    .write_all(Config::template_basic().as_slice())
                    .expect("Failed to write to stdout");
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let Self { commands, url, username, password, .. } = self;
        let Some(commands) = commands else {
            let help = Self::command().render_long_help().ansi().to_string();
            std::io::stderr().write_all(help.as_bytes()).expect("Failed to write to stderr");
            return Ok(-1);
        };
        let credentials = Credentials::from_parts(url, username, password)?;

        let fut = async move {
            match commands {
                Commands::Publish(cmd) => cmd.run(credentials, config).await?,
                Commands::Login => login::run(credentials, config).await?,
                Commands::Version { .. } | Commands::Completions { .. } | Commands::DefaultConfig => {}
            }
            Ok::<_, Error>(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}
