use std::path::PathBuf;

use snafu::Snafu;

/// Why a template file could not be turned into a request body.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read template {}, error: {source}", filename.display()))]
    ReadTemplate { filename: PathBuf, source: std::io::Error },

    #[snafu(display("Failed to parse template {}, error: {source}", filename.display()))]
    ParseTemplate { filename: PathBuf, source: serde_yaml::Error },

    #[snafu(display("Template {} has no `{field}`", filename.display()))]
    MissingField { filename: PathBuf, field: &'static str },
}
