//! Client-side filtering of service binding events
//!
//! The audit events API filters by target guid, but a binding event's target
//! is the binding itself. The service instance only appears inside the
//! type-specific payload, so matching happens here after the fetch.

use tracing::debug;

use crate::events::{AuditEvent, SERVICE_BINDING_CREATE, SERVICE_BINDING_DELETE};

/// Event types requested from the server for a binding query
pub const SERVICE_BINDING_EVENT_TYPES: [&str; 2] =
    [SERVICE_BINDING_CREATE, SERVICE_BINDING_DELETE];

/// Whether `event` is a binding create/delete for `service_instance_guid`
///
/// Payloads that fail to decode never match.
pub fn references_service_instance(event: &AuditEvent, service_instance_guid: &str) -> bool {
    if event.event_type != SERVICE_BINDING_CREATE && event.event_type != SERVICE_BINDING_DELETE {
        return false;
    }

    match event.payload() {
        Ok(payload) => payload.service_instance_guid() == Some(service_instance_guid),
        Err(e) => {
            debug!(
                event = %event.guid,
                event_type = %event.event_type,
                "Skipping event with undecodable payload: {}",
                e
            );
            false
        }
    }
}

/// Keep binding events that reference `service_instance_guid`, in input order
pub fn filter_service_binding_events(
    events: Vec<AuditEvent>,
    service_instance_guid: &str,
) -> Vec<AuditEvent> {
    let before = events.len();
    let kept: Vec<AuditEvent> = events
        .into_iter()
        .filter(|event| references_service_instance(event, service_instance_guid))
        .collect();

    debug!(
        kept = kept.len(),
        dropped = before - kept.len(),
        "Filtered service binding events for {}",
        service_instance_guid
    );

    kept
}
