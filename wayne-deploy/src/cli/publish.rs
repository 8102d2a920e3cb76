use std::{io::Write, path::PathBuf, sync::Arc};

use clap::{ArgAction, Args, ValueEnum};
use crossterm::style::Stylize;
use wayne_client::{
    Credentials, DeployContext, Deployer, FileTokenStore, Identity, Published, RecordKind, Session,
    TemplateLoader,
};

use crate::{
    cli::error::{self, Error},
    config::Config,
};

/// A kind selectable with `--only`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PublishStep {
    /// Register and push the deployment.
    Deployment,
    /// Resolve the service record, then register and push the service.
    Service,
    /// Resolve the ingress record, then register and push the ingress.
    Ingress,
}

impl From<PublishStep> for RecordKind {
    fn from(step: PublishStep) -> Self {
        match step {
            PublishStep::Deployment => Self::Deployment,
            PublishStep::Service => Self::Service,
            PublishStep::Ingress => Self::Ingress,
        }
    }
}

/// Arguments of the `publish` subcommand.
///
/// The underscore spellings `--app_name`, `--project_name` and
/// `--k8s_cluser_name` are accepted as aliases.
#[derive(Args, Clone)]
pub struct PublishCommand {
    /// Namespace on the control plane. Underscores are replaced by hyphens.
    #[arg(long, help = "Namespace on the control plane, underscores become hyphens")]
    pub namespace: String,

    /// Application name. Underscores are replaced by hyphens.
    #[arg(long = "app-name", alias = "app_name", help = "Application name")]
    pub app_name: String,

    /// Deployment unit name. The service and the ingress share it, and the
    /// records are named `<namespace>.<project_name>`.
    #[arg(
        long = "project-name",
        alias = "project_name",
        help = "Deployment unit name, also used for the service and the ingress"
    )]
    pub project_name: String,

    /// Image set on the first container of the deployment.
    #[arg(long, help = "Container image reference")]
    pub image: String,

    /// Cluster the templates are pushed to, and the cluster a newly created
    /// namespace is bound to.
    #[arg(
        long = "k8s-cluster-name",
        alias = "k8s_cluser_name",
        help = "Cluster name as known to the control plane"
    )]
    pub cluster_name: String,

    /// Overrides `templateDirectory` from the configuration file.
    #[arg(long = "template-dir", help = "Directory holding the YAML templates")]
    pub template_directory: Option<PathBuf>,

    /// Kinds to publish. Empty means all of them.
    #[arg(
        long = "only",
        value_enum,
        help = "Publish only the given kinds; may be repeated. Order is always deployment, \
                service, ingress"
    )]
    pub only: Vec<PublishStep>,

    /// Logs every request with its payload. `--debug` alone means `true`.
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        help = "Log every outgoing request with its payload"
    )]
    pub debug: bool,
}

impl PublishCommand {
    /// Loads every template, then resolves and publishes under the run
    /// deadline. Ctrl-C drops the in-flight run.
    ///
    /// # Errors
    ///
    /// Returns `Client` when the run fails and `Interrupted` on Ctrl-C.
    pub async fn run(self, credentials: Credentials, config: Config) -> Result<(), Error> {
        let Self {
            namespace,
            app_name,
            project_name,
            image,
            cluster_name,
            template_directory,
            only,
            debug,
        } = self;

        let identity = Identity::new(
            normalize_name(&namespace),
            normalize_name(&app_name),
            normalize_name(&project_name),
            cluster_name,
            image,
        );
        let session = Session::new(
            credentials,
            Arc::new(FileTokenStore::new(config.token_file_path.clone())),
            config.session_options(debug),
        )?;
        let loader = TemplateLoader::new(
            template_directory.unwrap_or_else(|| config.template_directory.clone()),
        );
        let context = DeployContext::new(session, &loader, identity, config.settings()).await?;

        let steps = if only.is_empty() {
            RecordKind::ALL.to_vec()
        } else {
            only.into_iter().map(RecordKind::from).collect()
        };

        let deployer = Deployer::new(context);
        tokio::select! {
            result = deployer.run_with_deadline(&steps, config.run_timeout(), print_published) => {
                result.map_err(Error::from)
            }
            _ = tokio::signal::ctrl_c() => error::InterruptedSnafu.fail(),
        }
    }
}

fn normalize_name(name: &str) -> String { name.replace('_', "-") }

/// Prints one line per finished step: green on success, yellow for a
/// tolerated push failure.
fn print_published(published: &Published) {
    let Published { kind, app_name, project_name, cluster_name, status, .. } = published;
    let line = if published.is_success() {
        format!(
            "app: {app_name}, project: {project_name}, {kind} deploy into cluster {cluster_name} \
             successful"
        )
        .green()
        .to_string()
    } else {
        format!(
            "app: {app_name}, project: {project_name}, {kind} push to cluster {cluster_name} \
             answered {status}"
        )
        .yellow()
        .to_string()
    };
    std::io::stdout().write_all(format!("{line}\n").as_bytes()).expect("Failed to write to stdout");
}
