//! Typed views over the event `data` payload
//!
//! The payload schema is selected by the event type tag. Only the service
//! binding shapes are modelled; everything else decodes to `Unknown`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{SERVICE_BINDING_CREATE, SERVICE_BINDING_DELETE};

/// Relationship key that points at the bound service instance
const SERVICE_INSTANCE_RELATIONSHIP: &str = "service_instance";

/// Relationship key that points at the bound app
const APP_RELATIONSHIP: &str = "app";

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ServiceBindingCreate(ServiceBindingCreatePayload),
    ServiceBindingDelete(ServiceBindingDeletePayload),
    Unknown,
}

impl EventPayload {
    /// Decode `data` by inspecting the type tag first
    pub fn decode(event_type: &str, data: &serde_json::Value) -> serde_json::Result<Self> {
        match event_type {
            SERVICE_BINDING_CREATE => {
                ServiceBindingCreatePayload::deserialize(data).map(Self::ServiceBindingCreate)
            }
            SERVICE_BINDING_DELETE => {
                ServiceBindingDeletePayload::deserialize(data).map(Self::ServiceBindingDelete)
            }
            _ => Ok(Self::Unknown),
        }
    }

    /// Guid of the service instance the payload refers to, if any
    pub fn service_instance_guid(&self) -> Option<&str> {
        match self {
            Self::ServiceBindingCreate(p) => {
                p.request.relationship_guid(SERVICE_INSTANCE_RELATIONSHIP)
            }
            Self::ServiceBindingDelete(p) => Some(p.request.service_instance_guid.as_str()),
            Self::Unknown => None,
        }
    }

    /// Guid of the app the payload refers to, if any
    pub fn app_guid(&self) -> Option<&str> {
        match self {
            Self::ServiceBindingCreate(p) => p.request.relationship_guid(APP_RELATIONSHIP),
            Self::ServiceBindingDelete(p) => p.request.app_guid.as_deref(),
            Self::Unknown => None,
        }
    }
}

/// `data` of an `audit.service_binding.create` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBindingCreatePayload {
    pub request: ServiceBindingCreateRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBindingCreateRequest {
    /// Binding parameters as submitted; the API redacts them
    #[serde(default)]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub name: Option<String>,

    pub relationships: HashMap<String, ServiceBindingRelationship>,
}

impl ServiceBindingCreateRequest {
    fn relationship_guid(&self, key: &str) -> Option<&str> {
        self.relationships
            .get(key)
            .map(|relationship| relationship.data.guid.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBindingRelationship {
    pub data: RelationshipData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipData {
    pub guid: String,
}

/// `data` of an `audit.service_binding.delete` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBindingDeletePayload {
    pub request: ServiceBindingDeleteRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceBindingDeleteRequest {
    #[serde(default)]
    pub app_guid: Option<String>,

    pub service_instance_guid: String,
}
