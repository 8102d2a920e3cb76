//! Fixtures shared by the unit tests: the bundled templates and a context that
//! talks to a mock control plane.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use wayne_deploy_base::consts::templates;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, path_regex},
};

use crate::{
    credentials::Credentials,
    identity::Identity,
    session::{Session, SessionOptions},
    template::TemplateLoader,
    token::{MemoryTokenStore, Token},
    workflow::{DeployContext, Settings},
};

macro_rules! bundled_template {
    ($name:literal) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates/", $name))
    };
}

pub const NAMESPACE_RECORD: &str = bundled_template!("wayne_namespace.yml");
pub const APPLICATION_RECORD: &str = bundled_template!("wayne_project.yml");
pub const DEPLOYMENT_RECORD: &str = bundled_template!("wayne_deployment.yml");
pub const DEPLOYMENT_TEMPLATE: &str = bundled_template!("wayne_deployment_tpl.yml");
pub const SERVICE_TEMPLATE: &str = bundled_template!("wayne_service_tpl.yml");
pub const DEPLOYMENT_MANIFEST: &str = bundled_template!("k8s_deployment.yml");
pub const SERVICE_MANIFEST: &str = bundled_template!("k8s_service.yml");
pub const INGRESS_MANIFEST: &str = bundled_template!("k8s_ingress.yml");

const TEMPLATE_FILES: [(&str, &str); 10] = [
    (templates::NAMESPACE, NAMESPACE_RECORD),
    (templates::APPLICATION, APPLICATION_RECORD),
    (templates::DEPLOYMENT_RECORD, DEPLOYMENT_RECORD),
    (templates::SERVICE_RECORD, bundled_template!("wayne_service.yml")),
    (templates::INGRESS_RECORD, bundled_template!("wayne_ingress.yml")),
    (templates::DEPLOYMENT_TEMPLATE, DEPLOYMENT_TEMPLATE),
    (templates::SERVICE_TEMPLATE, SERVICE_TEMPLATE),
    (templates::DEPLOYMENT_MANIFEST, DEPLOYMENT_MANIFEST),
    (templates::SERVICE_MANIFEST, SERVICE_MANIFEST),
    (templates::INGRESS_MANIFEST, INGRESS_MANIFEST),
];

pub fn identity() -> Identity {
    Identity::new("team-a", "svc-x", "api", "prod", "registry/svc-x:1.0")
}

/// A temporary directory holding every bundled template.
pub fn template_directory() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in TEMPLATE_FILES {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

/// A session against `server` that already holds a token, so no login is
/// expected unless a test answers with `401`.
pub fn session(server: &MockServer) -> Session {
    let credentials = Credentials::new(server.uri(), "deployer", "secret").unwrap();
    let store = Arc::new(MemoryTokenStore::with_token(Token::new("token")));
    Session::new(credentials, store, SessionOptions::default()).unwrap()
}

/// A context for [`identity`] built from the bundled templates.
pub async fn context(server: &MockServer) -> DeployContext {
    let dir = template_directory();
    let loader = TemplateLoader::new(dir.path());
    DeployContext::new(session(server), &loader, identity(), Settings::default()).await.unwrap()
}

/// Answers every namespace, application and record listing with nothing.
pub async fn mount_empty_listings(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/currentuser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "namespaces": [] }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v1/(namespaces/\d+/apps|apps/\d+/(deployments|services|ingresses))$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "list": null, "totalPage": 0 }
        })))
        .mount(server)
        .await;
}
