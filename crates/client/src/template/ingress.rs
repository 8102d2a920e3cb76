//! Ingress manifests in either API shape.
//!
//! `networking.k8s.io/v1` documents name their backend at
//! `backend.service.name`, while `extensions/v1beta1` and
//! `networking.k8s.io/v1beta1` documents use `backend.serviceName`. The
//! shape is chosen by `apiVersion` and stamping writes the matching path.

use k8s_openapi::{api::networking::v1::Ingress, apimachinery::pkg::apis::meta::v1::ObjectMeta};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::manifest::Manifest;
use crate::resolver::RecordKind;

/// API versions that carry the `serviceName` backend.
pub const LEGACY_INGRESS_API_VERSIONS: [&str; 2] =
    ["extensions/v1beta1", "networking.k8s.io/v1beta1"];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum IngressManifest {
    V1(Box<Ingress>),
    V1beta1(Box<LegacyIngress>),
}

impl<'de> Deserialize<'de> for IngressManifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let legacy = value
            .get("apiVersion")
            .and_then(Value::as_str)
            .is_some_and(|version| LEGACY_INGRESS_API_VERSIONS.contains(&version));
        if legacy {
            serde_json::from_value(value)
                .map(|ingress| Self::V1beta1(Box::new(ingress)))
                .map_err(serde::de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(|ingress| Self::V1(Box::new(ingress)))
                .map_err(serde::de::Error::custom)
        }
    }
}

impl Manifest for IngressManifest {
    const KIND: RecordKind = RecordKind::Ingress;

    fn missing_field(&self) -> Option<&'static str> {
        match self {
            Self::V1(ingress) => ingress.missing_field(),
            Self::V1beta1(ingress) => ingress.missing_field(),
        }
    }

    fn set_namespace(&mut self, namespace: &str) {
        match self {
            Self::V1(ingress) => ingress.set_namespace(namespace),
            Self::V1beta1(ingress) => ingress.set_namespace(namespace),
        }
    }
}

/// A `v1beta1` ingress. Only the fields that stamping touches are typed;
/// everything else is carried through unchanged.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyIngress {
    pub api_version: String,

    pub kind: String,

    #[serde(default)]
    pub metadata: ObjectMeta,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<LegacyIngressSpec>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LegacyIngressSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<LegacyIngressRule>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LegacyIngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<LegacyHttpRule>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LegacyHttpRule {
    #[serde(default)]
    pub paths: Vec<LegacyHttpPath>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct LegacyHttpPath {
    #[serde(default)]
    pub backend: LegacyBackend,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `servicePort` stays in `extra`.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBackend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LegacyIngress {
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

    pub(super) fn first_rule_mut(&mut self) -> Option<&mut LegacyIngressRule> {
        self.spec.as_mut().and_then(|spec| spec.rules.as_mut()).and_then(|rules| rules.first_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const LEGACY_INGRESS: &str = "\
apiVersion: extensions/v1beta1
kind: Ingress
metadata:
  name: placeholder
  annotations:
    kubernetes.io/ingress.class: nginx
spec:
  rules:
    - host: placeholder
      http:
        paths:
          - path: /
            backend:
              serviceName: placeholder
              servicePort: 80
";

    #[test]
    fn test_shape_follows_api_version() {
        let ingress: IngressManifest = serde_yaml::from_str(testing::INGRESS_MANIFEST).unwrap();
        assert!(matches!(ingress, IngressManifest::V1(_)));

        let ingress: IngressManifest = serde_yaml::from_str(LEGACY_INGRESS).unwrap();
        assert!(matches!(ingress, IngressManifest::V1beta1(_)));
        assert_eq!(ingress.missing_field(), None);
    }

    #[test]
    fn test_legacy_fields_survive() {
        let ingress: IngressManifest = serde_yaml::from_str(LEGACY_INGRESS).unwrap();
        let value = serde_json::to_value(&ingress).unwrap();
        assert_eq!(value["apiVersion"], "extensions/v1beta1");
        assert_eq!(value["metadata"]["annotations"]["kubernetes.io/ingress.class"], "nginx");
        let backend = &value["spec"]["rules"][0]["http"]["paths"][0]["backend"];
        assert_eq!(backend["serviceName"], "placeholder");
        assert_eq!(backend["servicePort"], 80);
        assert!(backend.get("service").is_none());
    }

    #[test]
    fn test_legacy_without_paths_is_incomplete() {
        let ingress: IngressManifest = serde_yaml::from_str(
            "apiVersion: extensions/v1beta1\nkind: Ingress\nmetadata:\n  name: web\nspec:\n  \
             rules:\n    - host: web.local\n      http:\n        paths: []\n",
        )
        .unwrap();
        assert_eq!(ingress.missing_field(), Some("spec.rules[0].http.paths"));
    }

    #[test]
    fn test_unknown_api_version_is_rejected() {
        let err = serde_yaml::from_str::<IngressManifest>(
            "apiVersion: example.com/v9\nkind: Ingress\nmetadata:\n  name: web\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("networking.k8s.io/v1"));
    }
}
