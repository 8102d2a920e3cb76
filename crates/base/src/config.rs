use std::path::PathBuf;

use directories::BaseDirs;

use crate::consts::TOKEN_FILE_NAME;

/// Location of the cached bearer token, `~/.wayne_token` on most systems.
///
/// Falls back to the temporary directory when no home directory can be
/// determined for the current user.
#[inline]
#[must_use]
pub fn default_token_file_path() -> PathBuf {
    BaseDirs::new()
        .map_or_else(std::env::temp_dir, |base_dirs| base_dirs.home_dir().to_path_buf())
        .join(TOKEN_FILE_NAME)
}

#[inline]
#[must_use]
pub fn default_template_directory() -> PathBuf { PathBuf::from(".") }
