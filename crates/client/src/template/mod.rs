mod error;
mod ingress;
mod manifest;
mod publish;
mod record;

use std::path::{Path, PathBuf};

use k8s_openapi::api::{apps::v1::Deployment, core::v1::Service};
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use wayne_deploy_base::consts::templates;

pub use self::{
    error::Error,
    ingress::{
        IngressManifest, LEGACY_INGRESS_API_VERSIONS, LegacyBackend, LegacyHttpPath,
        LegacyHttpRule, LegacyIngress, LegacyIngressRule, LegacyIngressSpec,
    },
    manifest::Manifest,
    publish::{AppRef, DeploymentTemplate, IngressTemplate, ServiceRef, ServiceTemplate},
    record::{ApplicationTemplate, NamespaceRef, NamespaceTemplate, RecordTemplate},
};
pub(crate) use self::manifest::{stamp_deployment, stamp_ingress, stamp_service};
use crate::resolver::RecordKind;

/// Every document a run needs, read and checked before the first request.
///
/// Creators and publishers stamp clones, so these stay as they were on disk.
#[derive(Clone, Debug)]
pub struct Templates {
    pub namespace: NamespaceTemplate,
    pub application: ApplicationTemplate,
    pub deployment_record: RecordTemplate,
    pub service_record: RecordTemplate,
    pub ingress_record: RecordTemplate,
    pub deployment_template: DeploymentTemplate,
    pub service_template: ServiceTemplate,
    pub deployment: Deployment,
    pub service: Service,
    pub ingress: IngressManifest,
}

impl Templates {
    /// The registration body for a record of `kind`.
    #[must_use]
    pub const fn record(&self, kind: RecordKind) -> &RecordTemplate {
        match kind {
            RecordKind::Deployment => &self.deployment_record,
            RecordKind::Service => &self.service_record,
            RecordKind::Ingress => &self.ingress_record,
        }
    }
}

/// Reads template files from a single directory.
#[derive(Clone, Debug)]
pub struct TemplateLoader {
    directory: PathBuf,
}

impl TemplateLoader {
    pub fn new(directory: impl Into<PathBuf>) -> Self { Self { directory: directory.into() } }

    pub fn directory(&self) -> &Path { &self.directory }

    /// Loads all ten templates, stopping at the first one that fails.
    ///
    /// # Errors
    ///
    /// See [`TemplateLoader::load`] and [`TemplateLoader::load_manifest`].
    pub async fn load_all(&self) -> Result<Templates, Error> {
        Ok(Templates {
            namespace: self.load(templates::NAMESPACE).await?,
            application: self.load(templates::APPLICATION).await?,
            deployment_record: self.load(RecordKind::Deployment.record_template()).await?,
            service_record: self.load(RecordKind::Service.record_template()).await?,
            ingress_record: self.load(RecordKind::Ingress.record_template()).await?,
            deployment_template: self.load(templates::DEPLOYMENT_TEMPLATE).await?,
            service_template: self.load(templates::SERVICE_TEMPLATE).await?,
            deployment: self.load_manifest(templates::DEPLOYMENT_MANIFEST).await?,
            service: self.load_manifest(templates::SERVICE_MANIFEST).await?,
            ingress: self.load_manifest(templates::INGRESS_MANIFEST).await?,
        })
    }

    /// # Errors
    ///
    /// Returns `ReadTemplate` when the file cannot be read and
    /// `ParseTemplate` when it is not valid YAML of the expected shape.
    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T, Error> {
        let filename = self.directory.join(name);
        let content = tokio::fs::read_to_string(&filename)
            .await
            .with_context(|_| error::ReadTemplateSnafu { filename: filename.clone() })?;
        serde_yaml::from_str(&content).context(error::ParseTemplateSnafu { filename })
    }

    /// Loads a manifest and rejects it when a path that stamping writes below
    /// is absent.
    ///
    /// # Errors
    ///
    /// Same as [`TemplateLoader::load`], plus `MissingField`.
    pub async fn load_manifest<M: Manifest>(&self, name: &str) -> Result<M, Error> {
        let manifest = self.load::<M>(name).await?;
        if let Some(field) = manifest.missing_field() {
            return error::MissingFieldSnafu { filename: self.directory.join(name), field }.fail();
        }
        Ok(manifest)
    }
}
