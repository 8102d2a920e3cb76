//! The deployment run: resolve the namespace, the application and the
//! deployment record, then publish each requested kind in order.
//!
//! Steps run strictly one after another. A failed step ends the run without
//! undoing what earlier steps published.

use std::time::Duration;

use wayne_deploy_base::consts::{DEFAULT_INGRESS_DOMAIN, DEFAULT_PAGE_SIZE};

use crate::{
    api::ResourceId,
    error::Error,
    identity::Identity,
    publisher::{Published, Publisher, PushPolicy},
    resolver::{RecordKind, Resolver},
    session::Session,
    template::{TemplateLoader, Templates},
};

/// Knobs that change how resources are looked up and published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub page_size: u32,
    pub ingress_domain: String,
    pub push_policy: PushPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ingress_domain: DEFAULT_INGRESS_DOMAIN.to_string(),
            push_policy: PushPolicy::default(),
        }
    }
}

/// Everything a run shares: the session, the loaded templates, the identity
/// and the settings.
pub struct DeployContext {
    pub session: Session,
    pub templates: Templates,
    pub identity: Identity,
    pub settings: Settings,
}

impl DeployContext {
    /// Reads every template from `loader` before anything talks to the
    /// control plane.
    ///
    /// # Errors
    ///
    /// Returns `Template` when any template fails to load. No request has
    /// been sent at that point.
    pub async fn new(
        session: Session,
        loader: &TemplateLoader,
        identity: Identity,
        settings: Settings,
    ) -> Result<Self, Error> {
        let templates = loader.load_all().await?;
        Ok(Self { session, templates, identity, settings })
    }
}

/// Identifiers resolved before anything is published.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub namespace_id: ResourceId,
    pub app_id: ResourceId,
    pub deployment_id: ResourceId,
}

pub struct Deployer {
    context: DeployContext,
}

impl Deployer {
    pub const fn new(context: DeployContext) -> Self { Self { context } }

    pub const fn context(&self) -> &DeployContext { &self.context }

    /// # Errors
    ///
    /// Returns the first resolution error; later resources are not touched.
    pub async fn resolve(&self) -> Result<Resolved, Error> {
        let resolver = Resolver::new(&self.context);
        let namespace_id = resolver.namespace().await?;
        let app_id = resolver.application(namespace_id).await?;
        let deployment_id = resolver.deployment_record(app_id).await?;
        Ok(Resolved { namespace_id, app_id, deployment_id })
    }

    /// Resolves, then publishes every kind listed in `steps` in the fixed
    /// order deployment, service, ingress. `on_published` sees each step as
    /// soon as it completes.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or publish error.
    pub async fn run<F>(&self, steps: &[RecordKind], mut on_published: F) -> Result<(), Error>
    where
        F: FnMut(&Published),
    {
        let Resolved { app_id, deployment_id, .. } = self.resolve().await?;
        let publisher = Publisher::new(&self.context, app_id, deployment_id);
        for kind in RecordKind::ALL.into_iter().filter(|kind| steps.contains(kind)) {
            let published = publisher.publish(kind).await?;
            on_published(&published);
        }
        Ok(())
    }

    /// [`Deployer::run`] bounded by `timeout`. The in-flight request is
    /// dropped when the deadline passes.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` when the deadline passes, otherwise see
    /// [`Deployer::run`].
    pub async fn run_with_deadline<F>(
        &self,
        steps: &[RecordKind],
        timeout: Duration,
        on_published: F,
    ) -> Result<(), Error>
    where
        F: FnMut(&Published),
    {
        tokio::time::timeout(timeout, self.run(steps, on_published))
            .await
            .map_err(|_elapsed| Error::Timeout { timeout })?
    }
}
