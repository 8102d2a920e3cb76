//! Kubernetes manifests published through the control plane.

use std::collections::BTreeMap;

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        core::v1::{EnvVar, Service},
        networking::v1::Ingress,
    },
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
};
use serde::{Serialize, de::DeserializeOwned};
use wayne_deploy_base::consts::{env::CONTAINER_ENVIRONMENT, k8s::labels};

use super::ingress::IngressManifest;
use crate::{identity::Identity, resolver::RecordKind};

/// A manifest document loaded from disk.
pub trait Manifest: DeserializeOwned + Serialize {
    const KIND: RecordKind;

    /// The first path that stamping writes below but the document lacks.
    fn missing_field(&self) -> Option<&'static str>;

    fn set_namespace(&mut self, namespace: &str);
}

impl Manifest for Deployment {
    const KIND: RecordKind = RecordKind::Deployment;

    fn missing_field(&self) -> Option<&'static str> {
        let Some(spec) = &self.spec else {
            return Some("spec");
        };
        let Some(pod_spec) = &spec.template.spec else {
            return Some("spec.template.spec");
        };
        pod_spec.containers.is_empty().then_some("spec.template.spec.containers")
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.metadata.namespace = Some(namespace.to_string());
    }
}

impl Manifest for Service {
    const KIND: RecordKind = RecordKind::Service;

    fn missing_field(&self) -> Option<&'static str> {
        let Some(spec) = &self.spec else {
            return Some("spec");
        };
        spec.ports.as_ref().is_none_or(Vec::is_empty).then_some("spec.ports")
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.metadata.namespace = Some(namespace.to_string());
    }
}

impl Manifest for Ingress {
    const KIND: RecordKind = RecordKind::Ingress;

    fn missing_field(&self) -> Option<&'static str> {
        let Some(spec) = &self.spec else {
            return Some("spec");
        };
        let Some(rule) = spec.rules.as_ref().and_then(|rules| rules.first()) else {
            return Some("spec.rules");
        };
        let Some(http) = &rule.http else {
            return Some("spec.rules[0].http");
        };
        http.paths.is_empty().then_some("spec.rules[0].http.paths")
    }

    fn set_namespace(&mut self, namespace: &str) {
        self.metadata.namespace = Some(namespace.to_string());
    }
}

fn stamp_metadata(metadata: &mut ObjectMeta, identity: &Identity, name: &str) {
    metadata.name = Some(name.to_string());
    stamp_labels(metadata, identity, name);
}

fn stamp_labels(metadata: &mut ObjectMeta, identity: &Identity, app: &str) {
    metadata.labels.get_or_insert_with(BTreeMap::new).extend([
        (labels::WAYNE_APP.to_string(), identity.app_name().to_string()),
        (labels::WAYNE_NAMESPACE.to_string(), identity.namespace().to_string()),
        (labels::APP.to_string(), app.to_string()),
    ]);
}

pub(crate) fn stamp_deployment(deployment: &mut Deployment, identity: &Identity) {
    let project = identity.project_name();
    stamp_metadata(&mut deployment.metadata, identity, project);

    let spec = deployment.spec.get_or_insert_with(Default::default);
    spec.selector
        .match_labels
        .get_or_insert_with(BTreeMap::new)
        .extend([(labels::APP.to_string(), project.to_string())]);
    stamp_labels(spec.template.metadata.get_or_insert_with(Default::default), identity, project);

    let pod_spec = spec.template.spec.get_or_insert_with(Default::default);
    if let Some(container) = pod_spec.containers.first_mut() {
        container.name = project.to_string();
        container.image = Some(identity.image().to_string());
        container.env = Some(vec![EnvVar {
            name: CONTAINER_ENVIRONMENT.to_string(),
            value: Some(identity.namespace().to_string()),
            ..EnvVar::default()
        }]);
    }
}

pub(crate) fn stamp_service(service: &mut Service, identity: &Identity) {
    let name = identity.service_name();
    stamp_metadata(&mut service.metadata, identity, name);

    let spec = service.spec.get_or_insert_with(Default::default);
    spec.selector
        .get_or_insert_with(BTreeMap::new)
        .extend([(labels::APP.to_string(), identity.project_name().to_string())]);
    if let Some(port) = spec.ports.as_mut().and_then(|ports| ports.first_mut()) {
        port.name = Some(format!("{name}-80"));
    }
}

/// Sets the host of the first rule and points its first path at the
/// project's service, at the backend path the document's API version uses.
pub(crate) fn stamp_ingress(ingress: &mut IngressManifest, identity: &Identity, host: String) {
    let project = identity.project_name().to_string();
    match ingress {
        IngressManifest::V1(ingress) => {
            stamp_metadata(&mut ingress.metadata, identity, identity.ingress_name());
            let Some(rule) = ingress
                .spec
                .as_mut()
                .and_then(|spec| spec.rules.as_mut())
                .and_then(|rules| rules.first_mut())
            else {
                return;
            };
            rule.host = Some(host);
            if let Some(path) = rule.http.as_mut().and_then(|http| http.paths.first_mut()) {
                path.backend.service.get_or_insert_with(Default::default).name = project;
            }
        }
        IngressManifest::V1beta1(ingress) => {
            stamp_metadata(&mut ingress.metadata, identity, identity.ingress_name());
            let Some(rule) = ingress.first_rule_mut() else {
                return;
            };
            rule.host = Some(host);
            if let Some(path) = rule.http.as_mut().and_then(|http| http.paths.first_mut()) {
                path.backend.service_name = Some(project);
            }
        }
    }
}
