use std::path::PathBuf;

use snafu::Snafu;

/// Represents the errors that can occur while loading the configuration file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// Error returned when the configuration file specified by `filename`
    /// cannot be opened or read.
    ///
    /// # Arguments
    ///
    /// * `filename` - The path to the configuration file that failed to open.
    /// * `source` - The underlying [`std::io::Error`] that occurred.
    #[snafu(display("Failed to open config from {}, error: {source}", filename.display()))]
    OpenConfig { filename: PathBuf, source: std::io::Error },

    /// Error returned when the content of the configuration file specified by
    /// `filename` is not valid YAML or does not match the expected keys and
    /// value types.
    ///
    /// # Arguments
    ///
    /// * `filename` - The path to the configuration file that failed to parse.
    /// * `source` - The underlying [`serde_yaml::Error`] that occurred during
    ///   parsing.
    #[snafu(display("Failed to parse config from {}, error: {source}", filename.display()))]
    ParseConfig { filename: PathBuf, source: serde_yaml::Error },

    /// Error returned when a path from the command line or the configuration
    /// file cannot be expanded to an absolute path, for example because the
    /// home directory is unknown.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The path that could not be resolved.
    /// * `source` - The underlying [`std::io::Error`] that occurred during path
    ///   resolution.
    #[snafu(display("Failed to resolve file path {}, error: {source}", file_path.display()))]
    ResolveFilePath { file_path: PathBuf, source: std::io::Error },
}
