//! Client for the Wayne control plane.
//!
//! A run resolves (or creates) the namespace, the application and the
//! deployment record named after an [`Identity`], then publishes the
//! deployment, service and ingress manifests through the two-phase
//! register-then-push API.

mod api;
mod credentials;
mod error;
mod identity;
mod publisher;
mod resolver;
mod session;
pub mod template;
mod token;
mod workflow;

#[cfg(test)]
mod testing;

pub use self::{
    api::ResourceId,
    credentials::Credentials,
    error::Error,
    identity::Identity,
    publisher::{Published, Publisher, PushPolicy},
    resolver::{Descriptor, RecordKind, Resolver, ResourceKind},
    session::{ApiResponse, RequestMethod, Session, SessionOptions},
    template::{TemplateLoader, Templates},
    token::{FileTokenStore, MemoryTokenStore, Token, TokenStore},
    workflow::{DeployContext, Deployer, Resolved, Settings},
};
