//! Get-or-create resolution of control-plane resources.
//!
//! Every resource is looked up by the exact name [`Identity::record_name`]
//! derives for it. Only when no entry of that name exists is it created, so a
//! run creates each resource at most once.
//!
//! [`Identity::record_name`]: crate::identity::Identity::record_name

mod creator;

use std::{collections::HashSet, fmt};

use url::form_urlencoded;
use wayne_deploy_base::consts::templates;

use crate::{
    api::{self, CurrentUser, Page, ResourceId},
    error::Error,
    workflow::DeployContext,
};

/// The resources a control plane keeps per application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Deployment,
    Service,
    Ingress,
}

impl RecordKind {
    /// In publish order.
    pub const ALL: [Self; 3] = [Self::Deployment, Self::Service, Self::Ingress];

    /// Path segment of the record and template collections.
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Deployment => "deployments",
            Self::Service => "services",
            Self::Ingress => "ingresses",
        }
    }

    /// File name of the registration template for a record of this kind.
    pub const fn record_template(self) -> &'static str {
        match self {
            Self::Deployment => templates::DEPLOYMENT_RECORD,
            Self::Service => templates::SERVICE_RECORD,
            Self::Ingress => templates::INGRESS_RECORD,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deployment => "deployment",
            Self::Service => "service",
            Self::Ingress => "ingress",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Namespace,
    Application,
    Record(RecordKind),
}

impl From<RecordKind> for ResourceKind {
    fn from(kind: RecordKind) -> Self { Self::Record(kind) }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Namespace => f.write_str("namespace"),
            Self::Application => f.write_str("application"),
            Self::Record(kind) => write!(f, "{kind} record"),
        }
    }
}

/// What to resolve, together with the identifier of its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Descriptor {
    Namespace,
    Application { namespace_id: ResourceId },
    Record { kind: RecordKind, app_id: ResourceId },
}

impl Descriptor {
    pub const fn kind(self) -> ResourceKind {
        match self {
            Self::Namespace => ResourceKind::Namespace,
            Self::Application { .. } => ResourceKind::Application,
            Self::Record { kind, .. } => ResourceKind::Record(kind),
        }
    }
}

pub struct Resolver<'a> {
    context: &'a DeployContext,
}

impl<'a> Resolver<'a> {
    pub const fn new(context: &'a DeployContext) -> Self { Self { context } }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn namespace(&self) -> Result<ResourceId, Error> {
        self.resolve_or_create(Descriptor::Namespace).await
    }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn application(&self, namespace_id: ResourceId) -> Result<ResourceId, Error> {
        self.resolve_or_create(Descriptor::Application { namespace_id }).await
    }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn record(&self, kind: RecordKind, app_id: ResourceId) -> Result<ResourceId, Error> {
        self.resolve_or_create(Descriptor::Record { kind, app_id }).await
    }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn deployment_record(&self, app_id: ResourceId) -> Result<ResourceId, Error> {
        self.record(RecordKind::Deployment, app_id).await
    }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn service_record(&self, app_id: ResourceId) -> Result<ResourceId, Error> {
        self.record(RecordKind::Service, app_id).await
    }

    /// # Errors
    ///
    /// See [`Resolver::resolve_or_create`].
    pub async fn ingress_record(&self, app_id: ResourceId) -> Result<ResourceId, Error> {
        self.record(RecordKind::Ingress, app_id).await
    }

    /// Returns the identifier of the resource named after the run's identity,
    /// creating it when the listing has no entry of that exact name.
    ///
    /// # Errors
    ///
    /// Returns `Upstream` or `MalformedResponse` when a listing or create call
    /// fails.
    pub async fn resolve_or_create(&self, descriptor: Descriptor) -> Result<ResourceId, Error> {
        let kind = descriptor.kind();
        let name = self.context.identity.record_name(kind);

        if let Some(id) = self.find(descriptor, &name).await? {
            tracing::info!("Found {kind} {name} with id {id}");
            return Ok(id);
        }

        tracing::info!("No {kind} named {name}, creating it");
        let id = creator::create(self.context, descriptor, &name).await?;
        tracing::info!("Created {kind} {name} with id {id}");
        Ok(id)
    }

    async fn find(&self, descriptor: Descriptor, name: &str) -> Result<Option<ResourceId>, Error> {
        match descriptor {
            Descriptor::Namespace => {
                let user: CurrentUser =
                    self.context.session.get(api::CURRENT_USER).await?.data()?;
                Ok(user.namespaces.into_iter().find(|entry| entry.name == name).map(|entry| entry.id))
            }
            Descriptor::Application { namespace_id } => {
                let filters = [
                    ("sortby", "-id".to_string()),
                    ("deleted", "false".to_string()),
                    ("namespace", namespace_id.to_string()),
                    ("starred", "false".to_string()),
                ];
                self.find_in_pages(&api::applications(namespace_id), &filters, name).await
            }
            Descriptor::Record { kind, app_id } => {
                let filters = [
                    ("deleted", "false".to_string()),
                    ("relate", "all".to_string()),
                    ("appId", app_id.to_string()),
                    ("sortby", "id".to_string()),
                ];
                self.find_in_pages(&api::records(app_id, kind), &filters, name).await
            }
        }
    }

    /// Walks the listing page by page until `name` shows up or the listing
    /// is exhausted.
    ///
    /// The listing counts as exhausted on a page that is not exactly
    /// `pageSize` long, on a page without any id not seen before, or past the
    /// last page that `totalPage` (or `totalCount`) announces. A server that
    /// ignores the paging parameters therefore costs at most two requests.
    async fn find_in_pages(
        &self,
        path: &str,
        filters: &[(&str, String)],
        name: &str,
    ) -> Result<Option<ResourceId>, Error> {
        let page_size = self.context.settings.page_size.max(1);
        let page_len = usize::try_from(page_size).unwrap_or(usize::MAX);

        let mut seen = HashSet::new();
        let mut page_no: u64 = 1;
        loop {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("pageNo", &page_no.to_string())
                .append_pair("pageSize", &page_size.to_string())
                .extend_pairs(filters)
                .finish();
            let page: Page = self.context.session.get(&format!("{path}?{query}")).await?.data()?;
            let entries = page.list.unwrap_or_default();

            if let Some(entry) = entries.iter().find(|entry| entry.name == name) {
                return Ok(Some(entry.id));
            }

            let fresh = entries.iter().filter(|entry| seen.insert(entry.id)).count();
            let last_page = page
                .total_page
                .or_else(|| page.total_count.map(|count| count.div_ceil(u64::from(page_size))));
            if entries.len() > page_len {
                tracing::debug!(
                    "{path} returned {} entries for page size {page_size}, treating it as unpaged",
                    entries.len()
                );
                return Ok(None);
            }
            if entries.len() < page_len || fresh == 0 || last_page.is_some_and(|last| page_no >= last)
            {
                return Ok(None);
            }
            page_no += 1;
        }
    }
}
