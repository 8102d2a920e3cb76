//! Logging configuration shared by the Wayne Deploy binaries.
//!
//! `LogConfig` selects the log sinks (stderr, stdout, journald, file) and the
//! minimum level, and installs the global `tracing` subscriber.
use std::{fs::OpenOptions, path::PathBuf};

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use tracing_subscriber::{
    Layer, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

/// Where log records go and how verbose they are.
///
/// Stdout is kept free by default so that the success lines printed by the
/// CLI are not interleaved with log records.
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Append log records to this file when set.
    #[serde(default = "LogConfig::default_file_path")]
    pub file_path: Option<PathBuf>,

    /// A boolean indicating whether log records are sent to `journald`.
    #[serde(default = "LogConfig::default_emit_journald")]
    pub emit_journald: bool,

    /// A boolean indicating whether log records are written to standard
    /// output.
    #[serde(default = "LogConfig::default_emit_stdout")]
    pub emit_stdout: bool,

    /// A boolean indicating whether log records are written to standard
    /// error.
    #[serde(default = "LogConfig::default_emit_stderr")]
    pub emit_stderr: bool,

    /// The minimum level to be recorded.
    #[serde(default = "LogConfig::default_log_level")]
    #[serde_as(as = "DisplayFromStr")]
    pub level: tracing::Level,
}

impl Default for LogConfig {
    /// Returns a `LogConfig` that records `INFO` and above on standard error
    /// only.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wayne_deploy_cli::config::LogConfig;
    ///
    /// let config = LogConfig::default();
    /// assert_eq!(config.level, tracing::Level::INFO);
    /// assert!(config.emit_stderr);
    /// assert!(!config.emit_stdout);
    /// assert!(!config.emit_journald);
    /// assert!(config.file_path.is_none());
    /// ```
    fn default() -> Self {
        Self {
            file_path: Self::default_file_path(),
            emit_journald: Self::default_emit_journald(),
            emit_stdout: Self::default_emit_stdout(),
            emit_stderr: Self::default_emit_stderr(),
            level: Self::default_log_level(),
        }
    }
}

impl LogConfig {
    /// Returns the default log level, which is `INFO`.
    #[inline]
    #[must_use]
    pub const fn default_log_level() -> tracing::Level { tracing::Level::INFO }

    /// Returns the default log file path, which is `None`.
    #[inline]
    #[must_use]
    pub const fn default_file_path() -> Option<PathBuf> { None }

    /// Returns the default setting for `emit_journald`, which is `false`.
    #[inline]
    #[must_use]
    pub const fn default_emit_journald() -> bool { false }

    /// Returns the default setting for `emit_stdout`, which is `false`.
    #[inline]
    #[must_use]
    pub const fn default_emit_stdout() -> bool { false }

    /// Returns the default setting for `emit_stderr`, which is `true`.
    #[inline]
    #[must_use]
    pub const fn default_emit_stderr() -> bool { true }

    /// Installs the global `tracing` subscriber described by this
    /// configuration.
    ///
    /// A sink that cannot be opened is skipped; the remaining sinks still
    /// receive records.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been installed.
    pub fn registry(&self) {
        let Self { emit_journald, file_path, emit_stdout, emit_stderr, level: log_level } = self;

        let filter_layer = tracing_subscriber::filter::LevelFilter::from_level(*log_level);

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(emit_journald.then(|| LogDriver::Journald.layer()))
            .with(file_path.clone().map(|path| LogDriver::File(path).layer()))
            .with(emit_stdout.then(|| LogDriver::Stdout.layer()))
            .with(emit_stderr.then(|| LogDriver::Stderr.layer()))
            .init();
    }
}

/// The destinations a log record can be written to.
#[derive(Clone, Debug)]
enum LogDriver {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// The system `journald` service.
    Journald,
    /// A file, opened for appending.
    File(PathBuf),
}

impl LogDriver {
    /// Builds the `tracing_subscriber::Layer` for this sink.
    ///
    /// # Type Parameters
    ///
    /// * `S`: The `tracing::Subscriber` type that this layer will be attached
    ///   to.
    ///
    /// # Returns
    ///
    /// The boxed layer, or `None` when the log file is not writable or the
    /// `journald` socket is unavailable.
    #[allow(clippy::type_repetition_in_bounds)]
    fn layer<S>(self) -> Option<Box<dyn Layer<S> + Send + Sync + 'static>>
    where
        S: tracing::Subscriber,
        for<'a> S: LookupSpan<'a>,
    {
        let fmt = tracing_subscriber::fmt::layer().compact().with_target(false);

        match self {
            Self::Stdout => Some(Box::new(fmt.with_writer(std::io::stdout))),
            Self::Stderr => Some(Box::new(fmt.with_writer(std::io::stderr))),
            Self::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
                Some(Box::new(fmt.with_ansi(false).with_writer(file)))
            }
            Self::Journald => Some(Box::new(tracing_journald::layer().ok()?)),
        }
    }
}
