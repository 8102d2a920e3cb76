use std::fmt;

use snafu::{OptionExt, ResultExt};
use wayne_deploy_base::consts::env;

use crate::error::{self, Error};

/// Login material and the address of the control plane.
#[derive(Clone)]
pub struct Credentials {
    base_url: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Validates the base URL and builds the credentials.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBaseUrl` when `base_url` is not an absolute URL and
    /// `UnsupportedScheme` when it is neither http nor https.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let base_url = base_url.into();
        let parsed =
            url::Url::parse(&base_url).context(error::InvalidBaseUrlSnafu { url: base_url.clone() })?;
        snafu::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            error::UnsupportedSchemeSnafu { url: base_url.clone() }
        );

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Builds the credentials from optional values, typically collected from
    /// `WAYNE_USERNAME`, `WAYNE_PASSWORD` and `WAYNE_URL`. Empty values count
    /// as missing.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredential` naming the first absent variable, or the
    /// errors of [`Credentials::new`].
    pub fn from_parts(
        base_url: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, Error> {
        let non_empty = |value: Option<String>| value.filter(|value| !value.is_empty());
        let username =
            non_empty(username).context(error::MissingCredentialSnafu { variable: env::USERNAME })?;
        let password =
            non_empty(password).context(error::MissingCredentialSnafu { variable: env::PASSWORD })?;
        let base_url =
            non_empty(base_url).context(error::MissingCredentialSnafu { variable: env::URL })?;
        Self::new(base_url, username, password)
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub fn username(&self) -> &str { &self.username }

    pub(crate) fn password(&self) -> &str { &self.password }

    /// Joins an API path onto the base URL.
    pub(crate) fn url(&self, uri: &str) -> String { format!("{}{uri}", self.base_url) }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variable_is_named() {
        let err = Credentials::from_parts(
            Some("http://wayne.local".to_string()),
            Some("deployer".to_string()),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingCredential { variable } if variable == env::PASSWORD));

        let err = Credentials::from_parts(None, Some("deployer".to_string()), Some(String::new()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredential { variable } if variable == env::PASSWORD));

        let err = Credentials::from_parts(
            Some(String::new()),
            Some("deployer".to_string()),
            Some("secret".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingCredential { variable } if variable == env::URL));
    }

    #[test]
    fn test_reject_invalid_url() {
        let err = Credentials::new("wayne.local", "deployer", "secret").unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl { .. }));

        let err = Credentials::new("ftp://wayne.local", "deployer", "secret").unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_join_uri() {
        let credentials = Credentials::new("http://wayne.local/", "deployer", "secret").unwrap();
        assert_eq!(credentials.url("/currentuser"), "http://wayne.local/currentuser");
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::new("http://wayne.local", "deployer", "secret").unwrap();
        let output = format!("{credentials:?}");
        assert!(output.contains("deployer"));
        assert!(!output.contains("secret"));
    }
}
