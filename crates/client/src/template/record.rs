//! Registration bodies for namespaces, applications and records.
//!
//! Only the keys this tool writes are named; every other key of the file is
//! carried through unchanged. `metaData` is a mapping on disk and a JSON string
//! on the wire.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{json::JsonString, serde_as};

use crate::api::ResourceId;

/// `wayne_namespace.yml`
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kube_namespace: String,

    #[serde_as(serialize_as = "JsonString")]
    #[serde(default)]
    pub meta_data: Map<String, Value>,

    pub meta_data_obj: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NamespaceTemplate {
    /// Writes `namespace` into the name, the Kubernetes namespace and both
    /// metadata copies.
    pub fn stamp(&mut self, namespace: &str) {
        self.name = namespace.to_string();
        self.kube_namespace = namespace.to_string();
        let _previous = self.meta_data.insert("namespace".to_string(), namespace.into());
        let _previous = self.meta_data_obj.insert("namespace".to_string(), namespace.into());
    }
}

/// `wayne_project.yml`
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTemplate {
    #[serde(default)]
    pub name: String,

    pub namespace: NamespaceRef,

    #[serde_as(serialize_as = "JsonString")]
    #[serde(default)]
    pub meta_data: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationTemplate {
    pub fn stamp(&mut self, name: &str, namespace_id: ResourceId) {
        self.name = name.to_string();
        self.namespace.id = namespace_id;
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NamespaceRef {
    #[serde(default)]
    pub id: ResourceId,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `wayne_deployment.yml`, `wayne_service.yml` and `wayne_ingress.yml`
#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub app_id: ResourceId,

    #[serde_as(serialize_as = "JsonString")]
    #[serde(default)]
    pub meta_data: Map<String, Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordTemplate {
    pub fn stamp(&mut self, qualified_name: &str, app_id: ResourceId) {
        self.name = qualified_name.to_string();
        self.app_id = app_id;
    }
}
