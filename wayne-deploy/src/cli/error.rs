use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("{source}"))]
    Client { source: wayne_client::Error },

    #[snafu(display("{source}"))]
    Configuration { source: crate::config::Error },

    #[snafu(display("Failed to write to stdout, error: {source}"))]
    WriteStdout { source: std::io::Error },

    #[snafu(display("Failed to create tokio runtime, error: {source}"))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Interrupted before the run finished"))]
    Interrupted,
}

impl From<wayne_client::Error> for Error {
    fn from(source: wayne_client::Error) -> Self { Self::Client { source } }
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Configuration { source } }
}
