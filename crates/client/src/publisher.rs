//! Two-phase publishing: register a template under the application, then push
//! that template to the target cluster.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use snafu::ResultExt;
use wayne_deploy_base::PROJECT_NAME;

use crate::{
    api::{self, Created, ResourceId},
    error::{self, Error},
    resolver::{RecordKind, Resolver},
    template::{IngressTemplate, Manifest, stamp_deployment, stamp_ingress, stamp_service},
    workflow::DeployContext,
};

/// Whether a push answered with anything but `200 OK` fails the step.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PushPolicy {
    pub deployment: bool,
    pub service: bool,
    pub ingress: bool,
}

impl Default for PushPolicy {
    fn default() -> Self { Self { deployment: true, service: true, ingress: false } }
}

impl PushPolicy {
    #[must_use]
    pub const fn is_strict(self, kind: RecordKind) -> bool {
        match kind {
            RecordKind::Deployment => self.deployment,
            RecordKind::Service => self.service,
            RecordKind::Ingress => self.ingress,
        }
    }
}

/// Outcome of one publish step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Published {
    pub kind: RecordKind,
    pub app_name: String,
    pub project_name: String,
    pub cluster_name: String,
    pub record_id: ResourceId,
    pub template_id: ResourceId,
    pub status: StatusCode,
}

impl Published {
    /// `false` only for a tolerated push failure.
    #[must_use]
    pub fn is_success(&self) -> bool { self.status == StatusCode::OK }
}

pub struct Publisher<'a> {
    context: &'a DeployContext,
    app_id: ResourceId,
    deployment_id: ResourceId,
}

impl<'a> Publisher<'a> {
    pub const fn new(
        context: &'a DeployContext,
        app_id: ResourceId,
        deployment_id: ResourceId,
    ) -> Self {
        Self { context, app_id, deployment_id }
    }

    /// # Errors
    ///
    /// See the publish method of the matching kind.
    pub async fn publish(&self, kind: RecordKind) -> Result<Published, Error> {
        match kind {
            RecordKind::Deployment => self.publish_deployment().await,
            RecordKind::Service => self.publish_service().await,
            RecordKind::Ingress => self.publish_ingress().await,
        }
    }

    /// # Errors
    ///
    /// Returns `Upstream` or `MalformedResponse` when registration fails,
    /// and `PublishFailure` when the push is not answered with `200 OK` under
    /// a strict policy.
    pub async fn publish_deployment(&self) -> Result<Published, Error> {
        let DeployContext { templates, identity, .. } = self.context;

        let mut manifest = templates.deployment.clone();
        stamp_deployment(&mut manifest, identity);

        let mut payload = templates.deployment_template.clone();
        payload.name = identity.project_name().to_string();
        payload.template = encode(&manifest)?;
        payload.app.id = self.app_id;
        payload.app.namespace = Some(identity.namespace().to_string());
        payload.deployment_id = self.deployment_id;

        self.register_and_push(manifest, self.deployment_id, &payload).await
    }

    /// Resolves the service record first.
    ///
    /// # Errors
    ///
    /// Same as [`Publisher::publish_deployment`], plus resolution errors.
    pub async fn publish_service(&self) -> Result<Published, Error> {
        let DeployContext { templates, identity, .. } = self.context;
        let service_id = Resolver::new(self.context).service_record(self.app_id).await?;

        let mut manifest = templates.service.clone();
        stamp_service(&mut manifest, identity);

        let mut payload = templates.service_template.clone();
        payload.name = identity.service_name().to_string();
        payload.template = encode(&manifest)?;
        payload.service_id = service_id;
        payload.service.id = service_id;
        payload.service.name = identity.service_name().to_string();
        payload.service.meta_data = json!({ "clusters": [identity.cluster_name()] }).to_string();
        payload.service.app.id = self.app_id;

        self.register_and_push(manifest, service_id, &payload).await
    }

    /// Resolves the ingress record first. The registration body is built here
    /// rather than read from a file.
    ///
    /// # Errors
    ///
    /// Same as [`Publisher::publish_service`]. Push failures are only fatal
    /// when the ingress policy is strict.
    pub async fn publish_ingress(&self) -> Result<Published, Error> {
        let DeployContext { templates, identity, settings, .. } = self.context;
        let ingress_id = Resolver::new(self.context).ingress_record(self.app_id).await?;

        let mut manifest = templates.ingress.clone();
        stamp_ingress(&mut manifest, identity, identity.ingress_host(&settings.ingress_domain));

        let payload = IngressTemplate {
            description: format!("{} published by {PROJECT_NAME}", identity.ingress_name()),
            ingress_id,
            template: encode(&manifest)?,
            name: identity.ingress_name().to_string(),
        };

        self.register_and_push(manifest, ingress_id, &payload).await
    }

    async fn register_and_push<M, P>(
        &self,
        mut manifest: M,
        record_id: ResourceId,
        payload: &P,
    ) -> Result<Published, Error>
    where
        M: Manifest + Sync,
        P: Serialize + Sync,
    {
        let DeployContext { session, identity, settings, .. } = self.context;
        let kind = M::KIND;

        let Created { id: template_id } =
            session.post(&api::templates(self.app_id, kind), payload).await?.data()?;
        tracing::info!("Registered {kind} template {template_id} for record {record_id}");

        manifest.set_namespace(identity.namespace());
        let cluster = identity.cluster_name();
        let response = session
            .post(&api::push(self.app_id, kind, record_id, template_id, cluster), &manifest)
            .await?;

        if response.status == StatusCode::OK {
            tracing::info!(
                "Pushed {kind} {} of app {} to cluster {cluster}",
                identity.object_name(kind),
                identity.app_name()
            );
        } else if settings.push_policy.is_strict(kind) {
            return error::PublishFailureSnafu {
                kind,
                name: identity.object_name(kind),
                cluster,
                status: response.status,
                body: response.body,
            }
            .fail();
        } else {
            tracing::warn!(
                "Push of {kind} {} to cluster {cluster} answered {}, continuing: {}",
                identity.object_name(kind),
                response.status,
                response.body
            );
        }

        Ok(Published {
            kind,
            app_name: identity.app_name().to_string(),
            project_name: identity.project_name().to_string(),
            cluster_name: cluster.to_string(),
            record_id,
            template_id,
            status: response.status,
        })
    }
}

fn encode<M: Manifest>(manifest: &M) -> Result<String, Error> {
    serde_json::to_string(manifest).context(error::SerializeManifestSnafu { kind: M::KIND })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    use super::*;
    use crate::testing;

    async fn mount_register(server: &MockServer, kind: &str, template_id: i64) {
        Mock::given(method("POST"))
            .and(path(format!("/api/v1/apps/3/{kind}/tpls")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": template_id } })),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    #[test]
    fn test_default_push_policy() {
        let policy = PushPolicy::default();
        assert!(policy.is_strict(RecordKind::Deployment));
        assert!(policy.is_strict(RecordKind::Service));
        assert!(!policy.is_strict(RecordKind::Ingress));

        let policy: PushPolicy = serde_yaml::from_str("ingress: true").unwrap();
        assert_eq!(policy, PushPolicy { deployment: true, service: true, ingress: true });
    }

    #[tokio::test]
    async fn test_publish_deployment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/3/deployments/tpls"))
            .and(body_partial_json(json!({
                "name": "api",
                "deploymentId": 5,
                "app": { "id": 3, "namespace": "team-a" },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 42 } })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/deployments/5/tpls/42/clusters/prod"))
            .and(body_partial_json(json!({
                "metadata": { "name": "api", "namespace": "team-a" },
                "spec": { "template": { "spec": { "containers": [{ "image": "registry/svc-x:1.0" }] } } },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let context = testing::context(&server).await;
        let published = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish_deployment()
            .await
            .unwrap();
        assert!(published.is_success());
        assert_eq!(published.template_id, ResourceId::new(42));
        assert_eq!(published.cluster_name, "prod");

        // the registered template carries the stamped manifest as a string
        let requests = server.received_requests().await.unwrap();
        let register: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let manifest: Value =
            serde_json::from_str(register["template"].as_str().expect("template is a string"))
                .unwrap();
        assert_eq!(manifest["spec"]["template"]["spec"]["containers"][0]["env"][0]["value"], "team-a");
        assert!(manifest["metadata"].get("namespace").is_none());
    }

    #[tokio::test]
    async fn test_strict_push_failure_is_an_error() {
        let server = MockServer::start().await;
        mount_register(&server, "deployments", 42).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/deployments/5/tpls/42/clusters/prod"))
            .respond_with(ResponseTemplate::new(500).set_body_string("cluster unreachable"))
            .expect(1)
            .mount(&server)
            .await;

        let context = testing::context(&server).await;
        let err = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish(RecordKind::Deployment)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PublishFailure { kind: RecordKind::Deployment, ref cluster, status, ref body, .. }
                if cluster == "prod" && status == StatusCode::INTERNAL_SERVER_ERROR && body == "cluster unreachable"
        ));
    }

    #[tokio::test]
    async fn test_strict_service_push_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/apps/3/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "list": [{ "id": 8, "name": "team-a.api" }] }
            })))
            .mount(&server)
            .await;
        mount_register(&server, "services", 43).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/services/8/tpls/43/clusters/prod"))
            .respond_with(ResponseTemplate::new(500).set_body_string("port in use"))
            .expect(1)
            .mount(&server)
            .await;

        let context = testing::context(&server).await;
        let err = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish(RecordKind::Service)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PublishFailure { kind: RecordKind::Service, ref name, status, ref body, .. }
                if name == "api" && status == StatusCode::INTERNAL_SERVER_ERROR && body == "port in use"
        ));
    }

    #[tokio::test]
    async fn test_publish_service_resolves_record() {
        let server = MockServer::start().await;
        testing::mount_empty_listings(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/3/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 8 } })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/3/services/tpls"))
            .and(body_partial_json(json!({
                "name": "api",
                "serviceId": 8,
                "service": { "id": 8, "name": "api", "metaData": r#"{"clusters":["prod"]}"#, "app": { "id": 3 } },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 43 } })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/services/8/tpls/43/clusters/prod"))
            .and(body_partial_json(json!({
                "metadata": { "name": "api", "namespace": "team-a" },
                "spec": { "selector": { "app": "api" }, "ports": [{ "name": "api-80" }] },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let context = testing::context(&server).await;
        let published = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish_service()
            .await
            .unwrap();
        assert_eq!(published.record_id, ResourceId::new(8));
    }

    #[tokio::test]
    async fn test_publish_legacy_ingress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/apps/3/ingresses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "list": [{ "id": 9, "name": "team-a.api" }] }
            })))
            .mount(&server)
            .await;
        mount_register(&server, "ingresses", 44).await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/ingresses/9/tpls/44/clusters/prod"))
            .and(body_partial_json(json!({
                "apiVersion": "extensions/v1beta1",
                "metadata": { "name": "api", "namespace": "team-a" },
                "spec": { "rules": [{
                    "host": "api.api.team-a.yn.cn",
                    "http": { "paths": [{ "backend": { "serviceName": "api", "servicePort": 80 } }] },
                }] },
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut context = testing::context(&server).await;
        context.templates.ingress = serde_yaml::from_str(
            "apiVersion: extensions/v1beta1\nkind: Ingress\nmetadata:\n  name: placeholder\nspec:\n  \
             rules:\n    - host: placeholder\n      http:\n        paths:\n          - backend:\n              \
             serviceName: placeholder\n              servicePort: 80\n",
        )
        .unwrap();
        let published = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish_ingress()
            .await
            .unwrap();
        assert!(published.is_success());
    }

    #[tokio::test]
    async fn test_ingress_push_failure_is_tolerated_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/apps/3/ingresses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "list": [{ "id": 9, "name": "team-a.api" }] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/apps/3/ingresses/tpls"))
            .and(body_partial_json(json!({ "name": "api", "ingressId": 9 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "id": 44 } })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/kubernetes/apps/3/ingresses/9/tpls/44/clusters/prod"))
            .and(body_partial_json(json!({
                "spec": { "rules": [{ "host": "api.api.team-a.yn.cn" }] },
            })))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .expect(2)
            .mount(&server)
            .await;

        let mut context = testing::context(&server).await;
        let published = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish_ingress()
            .await
            .unwrap();
        assert!(!published.is_success());
        assert_eq!(published.status, StatusCode::CONFLICT);

        context.settings.push_policy.ingress = true;
        let err = Publisher::new(&context, ResourceId::new(3), ResourceId::new(5))
            .publish_ingress()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PublishFailure { kind: RecordKind::Ingress, .. }));
    }
}
