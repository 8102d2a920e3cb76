use crate::resolver::{RecordKind, ResourceKind};

/// The names a run works with; every control-plane name is derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    namespace: String,
    app_name: String,
    project_name: String,
    cluster_name: String,
    image: String,
}

impl Identity {
    pub fn new(
        namespace: impl Into<String>,
        app_name: impl Into<String>,
        project_name: impl Into<String>,
        cluster_name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            app_name: app_name.into(),
            project_name: project_name.into(),
            cluster_name: cluster_name.into(),
            image: image.into(),
        }
    }

    pub fn namespace(&self) -> &str { &self.namespace }

    pub fn app_name(&self) -> &str { &self.app_name }

    pub fn project_name(&self) -> &str { &self.project_name }

    pub fn cluster_name(&self) -> &str { &self.cluster_name }

    pub fn image(&self) -> &str { &self.image }

    pub fn service_name(&self) -> &str { &self.project_name }

    pub fn ingress_name(&self) -> &str { &self.project_name }

    /// Local name of the Kubernetes object published for `kind`.
    pub fn object_name(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Deployment => self.project_name(),
            RecordKind::Service => self.service_name(),
            RecordKind::Ingress => self.ingress_name(),
        }
    }

    /// `<namespace>.<local_name>`, the convention for record names.
    pub fn qualified_name(&self, local_name: &str) -> String {
        format!("{}.{local_name}", self.namespace)
    }

    /// The exact name the control plane knows a resource of `kind` by.
    ///
    /// Lookups compare against this name; any other spelling makes the
    /// resolver create a duplicate.
    pub fn record_name(&self, kind: ResourceKind) -> String {
        match kind {
            ResourceKind::Namespace => self.namespace.clone(),
            ResourceKind::Application => self.app_name.clone(),
            ResourceKind::Record(kind) => self.qualified_name(self.object_name(kind)),
        }
    }

    /// `<ingress_name>.api.<namespace>.<domain>`
    pub fn ingress_host(&self, domain: &str) -> String {
        format!("{}.api.{}.{domain}", self.ingress_name(), self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity { Identity::new("team-a", "svc-x", "api", "prod", "registry/svc-x:1.0") }

    #[test]
    fn test_record_names() {
        let identity = identity();
        assert_eq!(identity.record_name(ResourceKind::Namespace), "team-a");
        assert_eq!(identity.record_name(ResourceKind::Application), "svc-x");
        for kind in RecordKind::ALL {
            assert_eq!(identity.record_name(ResourceKind::Record(kind)), "team-a.api");
        }
    }

    #[test]
    fn test_ingress_host() {
        assert_eq!(identity().ingress_host("yn.cn"), "api.api.team-a.yn.cn");
    }
}
