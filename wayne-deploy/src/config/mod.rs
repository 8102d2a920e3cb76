mod error;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use resolve_path::PathResolveExt;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use wayne_client::{PushPolicy, SessionOptions, Settings};
use wayne_deploy_base::consts::{DEFAULT_INGRESS_DOMAIN, DEFAULT_PAGE_SIZE};
use wayne_deploy_cli::config::LogConfig;

pub use self::error::Error;

/// The configuration file of Wayne Deploy, read from YAML with camelCase
/// keys. Every key is optional.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding the ten template files. Defaults to the working
    /// directory.
    #[serde(default = "wayne_deploy_base::config::default_template_directory")]
    pub template_directory: PathBuf,

    /// Where the bearer token is cached between runs.
    #[serde(default = "wayne_deploy_base::config::default_token_file_path")]
    pub token_file_path: PathBuf,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Deadline for a whole `publish` run.
    #[serde(default = "default_run_timeout_seconds")]
    pub run_timeout_seconds: u64,

    /// Entries requested per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Suffix of the ingress host `<project>.<app>.<namespace>.<domain>`.
    #[serde(default = "default_ingress_domain")]
    pub ingress_domain: String,

    /// Per kind, whether a push answered with anything but `200 OK` fails the
    /// run.
    #[serde(default)]
    pub strict_push: PushPolicy,

    #[serde(default = "LogConfig::default")]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_directory: wayne_deploy_base::config::default_template_directory(),
            token_file_path: wayne_deploy_base::config::default_token_file_path(),
            request_timeout_seconds: default_request_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            run_timeout_seconds: default_run_timeout_seconds(),
            page_size: default_page_size(),
            ingress_domain: default_ingress_domain(),
            strict_push: PushPolicy::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Returns the first existing configuration file among the default path
    /// and the fallback directories, or the default path when none exists.
    pub fn search_config_file_path() -> PathBuf {
        let paths = vec![Self::default_path()]
            .into_iter()
            .chain(wayne_deploy_base::fallback_project_config_directories().into_iter().map(
                |mut path| {
                    path.push(wayne_deploy_base::CLI_CONFIG_NAME);
                    path
                },
            ))
            .collect::<Vec<_>>();
        for path in paths {
            let Ok(exists) = path.try_exists() else {
                continue;
            };
            if exists {
                return path;
            }
        }
        Self::default_path()
    }

    #[inline]
    pub fn default_path() -> PathBuf {
        [
            wayne_deploy_base::PROJECT_CONFIG_DIR.to_path_buf(),
            PathBuf::from(wayne_deploy_base::CLI_CONFIG_NAME),
        ]
        .into_iter()
        .collect()
    }

    /// Serialized default configuration, as printed by `default-config`.
    pub fn template_basic() -> Vec<u8> {
        serde_yaml::to_string(&Self::default()).unwrap_or_default().into_bytes()
    }

    /// Reads the configuration file at `path` and resolves every path it
    /// names.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed, or when a path
    /// cannot be resolved.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut config: Self = {
            let path =
                path.as_ref().try_resolve().map(|path| path.to_path_buf()).with_context(|_| {
                    error::ResolveFilePathSnafu { file_path: path.as_ref().to_path_buf() }
                })?;
            let data =
                std::fs::read(&path).context(error::OpenConfigSnafu { filename: path.clone() })?;
            serde_yaml::from_slice(&data).context(error::ParseConfigSnafu { filename: path })?
        };

        config.template_directory = resolve(&config.template_directory)?;
        config.token_file_path = resolve(&config.token_file_path)?;
        config.log.file_path = config.log.file_path.as_deref().map(resolve).transpose()?;

        Ok(config)
    }

    pub const fn session_options(&self, debug: bool) -> SessionOptions {
        SessionOptions {
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            connect_timeout: Duration::from_secs(self.connect_timeout_seconds),
            debug,
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            page_size: self.page_size,
            ingress_domain: self.ingress_domain.clone(),
            push_policy: self.strict_push,
        }
    }

    pub const fn run_timeout(&self) -> Duration { Duration::from_secs(self.run_timeout_seconds) }
}

fn resolve(path: &Path) -> Result<PathBuf, Error> {
    path.try_resolve()
        .map(|path| path.to_path_buf())
        .with_context(|_| error::ResolveFilePathSnafu { file_path: path.to_path_buf() })
}

const fn default_request_timeout_seconds() -> u64 { 30 }

const fn default_connect_timeout_seconds() -> u64 { 10 }

const fn default_run_timeout_seconds() -> u64 { 600 }

const fn default_page_size() -> u32 { DEFAULT_PAGE_SIZE }

fn default_ingress_domain() -> String { DEFAULT_INGRESS_DOMAIN.to_string() }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trip() {
        let config: Config = serde_yaml::from_slice(&Config::template_basic()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config() {
        let config: Config = serde_yaml::from_str(
            "templateDirectory: /srv/templates\npageSize: 20\nstrictPush:\n  ingress: true\n",
        )
        .unwrap();
        assert_eq!(config.template_directory, PathBuf::from("/srv/templates"));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.ingress_domain, "yn.cn");
        assert_eq!(config.run_timeout(), Duration::from_secs(600));
        assert!(config.strict_push.deployment);
        assert!(config.strict_push.ingress);

        let settings = config.settings();
        assert_eq!(settings.page_size, 20);
        assert!(settings.push_policy.ingress);
    }

    #[test]
    fn test_session_options() {
        let options = Config::default().session_options(true);
        assert_eq!(options.request_timeout, Duration::from_secs(30));
        assert_eq!(options.connect_timeout, Duration::from_secs(10));
        assert!(options.debug);
    }
}
