//! Template-registration bodies. Each one carries the stamped manifest as a
//! JSON string in `template`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ResourceId;

/// `wayne_deployment_tpl.yml`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub template: String,

    pub app: AppRef,

    #[serde(default)]
    pub deployment_id: ResourceId,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppRef {
    #[serde(default)]
    pub id: ResourceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `wayne_service_tpl.yml`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTemplate {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub template: String,

    #[serde(default)]
    pub service_id: ResourceId,

    pub service: ServiceRef,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    #[serde(default)]
    pub id: ResourceId,

    #[serde(default)]
    pub name: String,

    /// `{"clusters": [...]}` encoded as a string.
    #[serde(default)]
    pub meta_data: String,

    pub app: AppRef,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The ingress registration body; there is no file for it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngressTemplate {
    pub description: String,
    pub ingress_id: ResourceId,
    pub template: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_deployment_template_keeps_unknown_keys() {
        let mut template: DeploymentTemplate =
            serde_yaml::from_str(testing::DEPLOYMENT_TEMPLATE).unwrap();
        template.app.id = ResourceId::new(3);
        template.app.namespace = Some("team-a".to_string());
        template.deployment_id = ResourceId::new(5);

        let payload = serde_json::to_value(&template).unwrap();
        assert_eq!(payload["app"]["id"], 3);
        assert_eq!(payload["app"]["namespace"], "team-a");
        assert_eq!(payload["deploymentId"], 5);
        assert_eq!(payload["description"], "deployed by wayne-deploy");
    }

    #[test]
    fn test_service_ref_without_namespace() {
        let template: ServiceTemplate = serde_yaml::from_str(testing::SERVICE_TEMPLATE).unwrap();
        let payload = serde_json::to_value(&template).unwrap();
        assert!(payload["service"]["app"].get("namespace").is_none());
        assert_eq!(payload["service"]["metaData"], "");
    }
}
