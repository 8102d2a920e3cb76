use serde::Serialize;
use serde_json::json;

use super::Descriptor;
use crate::{
    api::{self, Created, ResourceId},
    error::Error,
    workflow::DeployContext,
};

/// Registers the resource `descriptor` names under `name` and returns the id
/// the control plane assigned to it.
pub(super) async fn create(
    context: &DeployContext,
    descriptor: Descriptor,
    name: &str,
) -> Result<ResourceId, Error> {
    match descriptor {
        Descriptor::Namespace => create_namespace(context, name).await,
        Descriptor::Application { namespace_id } => {
            let mut payload = context.templates.application.clone();
            payload.stamp(name, namespace_id);
            post_created(context, &api::applications(namespace_id), &payload).await
        }
        Descriptor::Record { kind, app_id } => {
            let mut payload = context.templates.record(kind).clone();
            payload.stamp(name, app_id);
            post_created(context, &api::records(app_id, kind), &payload).await
        }
    }
}

/// A new namespace is bound to the target cluster right away; a failed
/// binding fails the whole resolution.
async fn create_namespace(context: &DeployContext, namespace: &str) -> Result<ResourceId, Error> {
    let mut payload = context.templates.namespace.clone();
    payload.stamp(namespace);
    let id = post_created(context, api::NAMESPACES, &payload).await?;

    let cluster = context.identity.cluster_name();
    let _response = context
        .session
        .post(&api::namespace_cluster(namespace, cluster), &json!({}))
        .await?
        .ensure_success()?;
    tracing::info!("Bound namespace {namespace} to cluster {cluster}");
    Ok(id)
}

async fn post_created<P>(context: &DeployContext, uri: &str, payload: &P) -> Result<ResourceId, Error>
where
    P: Serialize + Sync,
{
    let Created { id } = context.session.post(uri, payload).await?.data()?;
    Ok(id)
}
