pub const TOKEN_FILE_NAME: &str = ".wayne_token";

pub const DEFAULT_INGRESS_DOMAIN: &str = "yn.cn";

pub const DEFAULT_PAGE_SIZE: u32 = 100;

pub mod env {
    pub const USERNAME: &str = "WAYNE_USERNAME";
    pub const PASSWORD: &str = "WAYNE_PASSWORD";
    pub const URL: &str = "WAYNE_URL";

    /// Name of the environment variable injected into the published container.
    pub const CONTAINER_ENVIRONMENT: &str = "ENV";
}

pub mod k8s {
    pub mod labels {
        pub const APP: &str = "app";
        pub const WAYNE_APP: &str = "wayne-app";
        pub const WAYNE_NAMESPACE: &str = "wayne-ns";
    }
}

pub mod templates {
    pub const NAMESPACE: &str = "wayne_namespace.yml";
    pub const APPLICATION: &str = "wayne_project.yml";
    pub const DEPLOYMENT_RECORD: &str = "wayne_deployment.yml";
    pub const SERVICE_RECORD: &str = "wayne_service.yml";
    pub const INGRESS_RECORD: &str = "wayne_ingress.yml";

    pub const DEPLOYMENT_TEMPLATE: &str = "wayne_deployment_tpl.yml";
    pub const SERVICE_TEMPLATE: &str = "wayne_service_tpl.yml";

    pub const DEPLOYMENT_MANIFEST: &str = "k8s_deployment.yml";
    pub const SERVICE_MANIFEST: &str = "k8s_service.yml";
    pub const INGRESS_MANIFEST: &str = "k8s_ingress.yml";
}
