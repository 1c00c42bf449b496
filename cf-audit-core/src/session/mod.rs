//! Platform session capability
//!
//! Everything the commands need from the logged-in cf CLI: the targeted org
//! and space, name lookups, the access token, the username and the API base.
//! Implementations:
//! - [`CfConfigSession`] reads the cf CLI config file and resolves names
//!   through the v3 API
//! - tests provide in-memory sessions

mod cf_config;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use cf_config::{cf_config_path, CfConfig, CfConfigSession, NamedFields};

/// An organization reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,
}

/// A space reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
}

/// A service instance reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    pub name: String,
}

/// Host-runtime callbacks, each fallible
///
/// Space lookups are scoped to an org and service lookups to an org and
/// optionally a space, since names are only unique within their parent.
#[async_trait]
pub trait Session: Send + Sync {
    async fn current_org(&self) -> Result<Organization>;

    async fn current_space(&self) -> Result<Space>;

    async fn org_by_name(&self, name: &str) -> Result<Organization>;

    async fn space_by_name(&self, org: &Organization, name: &str) -> Result<Space>;

    async fn service_by_name(
        &self,
        org: &Organization,
        space: Option<&Space>,
        name: &str,
    ) -> Result<ServiceInstance>;

    async fn access_token(&self) -> Result<String>;

    async fn username(&self) -> Result<String>;

    async fn api_base(&self) -> Result<String>;
}
