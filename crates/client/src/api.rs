//! Control-plane endpoints and the response shapes read from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resolver::RecordKind;

pub(crate) const LOGIN: &str = "/login/ldap";
pub(crate) const CURRENT_USER: &str = "/currentuser";
pub(crate) const NAMESPACES: &str = "/api/v1/namespaces";

/// Server-assigned identifier of a namespace, application, record or template.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ResourceId(i64);

impl ResourceId {
    pub const fn new(id: i64) -> Self { Self(id) }

    pub const fn get(self) -> i64 { self.0 }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

pub(crate) fn namespace_cluster(namespace: &str, cluster: &str) -> String {
    format!("/api/v1/kubernetes/namespaces/{namespace}/clusters/{cluster}")
}

pub(crate) fn applications(namespace_id: ResourceId) -> String {
    format!("{NAMESPACES}/{namespace_id}/apps")
}

pub(crate) fn records(app_id: ResourceId, kind: RecordKind) -> String {
    format!("/api/v1/apps/{app_id}/{}", kind.collection())
}

pub(crate) fn templates(app_id: ResourceId, kind: RecordKind) -> String {
    format!("{}/tpls", records(app_id, kind))
}

pub(crate) fn push(
    app_id: ResourceId,
    kind: RecordKind,
    record_id: ResourceId,
    template_id: ResourceId,
    cluster: &str,
) -> String {
    format!(
        "/api/v1/kubernetes/apps/{app_id}/{}/{record_id}/tpls/{template_id}/clusters/{cluster}",
        kind.collection()
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CurrentUser {
    pub namespaces: Vec<NamedEntry>,
}

/// Any listed resource; only the fields used for matching are read.
#[derive(Debug, Deserialize)]
pub(crate) struct NamedEntry {
    pub id: ResourceId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page {
    #[serde(default)]
    pub list: Option<Vec<NamedEntry>>,

    #[serde(default)]
    pub total_page: Option<u64>,

    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub id: ResourceId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_path() {
        let path = push(
            ResourceId::new(3),
            RecordKind::Service,
            ResourceId::new(11),
            ResourceId::new(42),
            "prod",
        );
        assert_eq!(path, "/api/v1/kubernetes/apps/3/services/11/tpls/42/clusters/prod");
    }

    #[test]
    fn test_template_path() {
        assert_eq!(
            templates(ResourceId::new(3), RecordKind::Ingress),
            "/api/v1/apps/3/ingresses/tpls"
        );
        assert_eq!(applications(ResourceId::new(7)), "/api/v1/namespaces/7/apps");
    }

    #[test]
    fn test_page_with_null_list() {
        let page: Page = serde_json::from_str(r#"{"list":null,"totalPage":0}"#).unwrap();
        assert!(page.list.is_none());
        assert_eq!(page.total_page, Some(0));
        assert_eq!(page.total_count, None);
    }
}
