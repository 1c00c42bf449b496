//! Audit event model
//!
//! Mirrors the `/v3/audit_events` resource. Events are read-only: they are
//! fetched per query and never mutated. The `data` field stays an
//! uninterpreted JSON value until a consumer asks for its typed form through
//! [`AuditEvent::payload`].

mod payload;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use payload::{
    EventPayload, RelationshipData, ServiceBindingCreatePayload, ServiceBindingCreateRequest,
    ServiceBindingDeletePayload, ServiceBindingDeleteRequest, ServiceBindingRelationship,
};

/// Event type emitted when an app is bound to a service instance
pub const SERVICE_BINDING_CREATE: &str = "audit.service_binding.create";

/// Event type emitted when a service binding is removed
pub const SERVICE_BINDING_DELETE: &str = "audit.service_binding.delete";

/// One page of the audit events listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEventPage {
    pub pagination: Pagination,

    #[serde(default)]
    pub resources: Vec<AuditEvent>,
}

/// Paging information reported by the API
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total_results: u64,

    #[serde(default)]
    pub total_pages: u64,

    /// Link to the following page, absent on the last page
    #[serde(default)]
    pub next: Option<Link>,
}

impl Pagination {
    /// Whether the server holds more pages than the one returned
    pub fn has_more_pages(&self) -> bool {
        self.total_pages > 1 || self.next.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

/// A single audit event
///
/// Only the envelope is checked when decoding: missing or `null` fields come
/// back empty and timestamps are kept as the server sent them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid: String,

    /// RFC 3339 as sent by the server; see [`AuditEvent::created_time`]
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,

    /// Dotted taxonomy, e.g. `audit.service_binding.create`
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub actor: Actor,

    #[serde(default, deserialize_with = "null_as_default")]
    pub target: Target,

    #[serde(default)]
    pub space: Option<GuidRef>,

    #[serde(default)]
    pub organization: Option<GuidRef>,

    /// Free-form payload whose shape depends on `event_type`
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default)]
    pub links: serde_json::Value,
}

impl AuditEvent {
    /// Decode `data` according to the event type
    ///
    /// Types without a known payload shape yield [`EventPayload::Unknown`].
    /// A known type whose payload does not match its shape is an error.
    pub fn payload(&self) -> serde_json::Result<EventPayload> {
        EventPayload::decode(&self.event_type, &self.data)
    }

    /// `created_at` as a UTC time, `None` when it is not RFC 3339
    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// The user or client that performed the action
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub actor_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// The resource the event is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid: String,

    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub target_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub guid: String,
}

/// `null` decodes like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
