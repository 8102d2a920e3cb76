use std::sync::Arc;

use snafu::ResultExt;
use tokio::io::AsyncWriteExt;
use wayne_client::{Credentials, FileTokenStore, Session};

use crate::{
    cli::error::{self, Error},
    config::Config,
};

/// Logs in even when a token is cached, replacing the cached token.
pub async fn run(credentials: Credentials, config: Config) -> Result<(), Error> {
    let store = FileTokenStore::new(config.token_file_path.clone());
    let message = format!(
        "Logged in to {} as {}, token cached at {}\n",
        credentials.base_url(),
        credentials.username(),
        store.path().display()
    );

    let session = Session::new(credentials, Arc::new(store), config.session_options(false))?;
    let _token = session.login().await?;

    tokio::io::stdout().write_all(message.as_bytes()).await.context(error::WriteStdoutSnafu)
}
