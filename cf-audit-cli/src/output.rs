//! Rendering of audit reports
//!
//! Pure functions over a finished report: no sorting, no filtering.

use anyhow::Result;
use cf_audit_core::events::{AuditEvent, EventPayload};
use cf_audit_core::AuditReport;
use chrono::SecondsFormat;
use std::collections::HashMap;
use tabled::{settings::Style, Table, Tabled};

/// Table row for one event
#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "time")]
    time: String,
    #[tabled(rename = "event")]
    event: String,
    #[tabled(rename = "actor")]
    actor: String,
    #[tabled(rename = "description")]
    description: String,
}

impl From<&AuditEvent> for EventRow {
    fn from(event: &AuditEvent) -> Self {
        Self {
            time: event
                .created_time()
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| event.created_at.clone()),
            event: event.event_type.clone(),
            actor: event.actor.name.clone(),
            description: describe(event),
        }
    }
}

/// `Getting ... events ... as user...` line describing the active filter
pub fn summary_line(report: &AuditReport) -> String {
    let filter = &report.filter;
    let names = report.display_names();

    let mut parts = vec!["Getting".to_string()];

    if filter.types.is_empty() {
        parts.push("all".to_string());
    } else {
        parts.push(filter.types.join(", "));
    }
    parts.push("events".to_string());

    let service_guids: Vec<String> = if filter.target_guids.is_empty() {
        report.service.iter().map(|s| s.guid.clone()).collect()
    } else {
        filter.target_guids.clone()
    };
    if !service_guids.is_empty() {
        parts.push(format!("for service {}", display(&service_guids, &names)));
    }

    if !filter.organization_guids.is_empty() {
        parts.push(format!(
            "in org {}",
            display(&filter.organization_guids, &names)
        ));

        if !filter.space_guids.is_empty() {
            parts.push(format!("/ space {}", display(&filter.space_guids, &names)));
        }
    }

    if let Some(username) = &report.username {
        parts.push(format!("as {username}"));
    }

    format!("{}...", parts.join(" "))
}

/// Guids shown by name where one is known
fn display(guids: &[String], names: &HashMap<String, String>) -> String {
    guids
        .iter()
        .map(|guid| names.get(guid).unwrap_or(guid).as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Aligned four-column table; header only when `events` is empty
pub fn event_table(events: &[AuditEvent]) -> String {
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();

    Table::new(&rows).with(Style::blank()).to_string()
}

/// One-line description of what an event did
pub fn describe(event: &AuditEvent) -> String {
    let Ok(payload) = event.payload() else {
        return describe_target(event);
    };
    let verb = match payload {
        EventPayload::ServiceBindingCreate(_) => "bound to",
        EventPayload::ServiceBindingDelete(_) => "unbound from",
        EventPayload::Unknown => return describe_target(event),
    };
    let instance = payload.service_instance_guid().unwrap_or("unknown");

    match payload.app_guid() {
        Some(app) => format!("app {app} {verb} service instance {instance}"),
        None => format!("{verb} service instance {instance}"),
    }
}

fn describe_target(event: &AuditEvent) -> String {
    let target = &event.target;
    let label = if target.name.is_empty() {
        &target.guid
    } else {
        &target.name
    };

    if target.target_type.is_empty() {
        label.clone()
    } else {
        format!("{} {}", target.target_type, label)
    }
}

/// Hint shown when the server holds more pages than the one displayed
pub fn paging_note(report: &AuditReport) -> Option<String> {
    let pagination = &report.pagination;
    if !pagination.has_more_pages() {
        return None;
    }

    let page = u64::from(report.filter.page.unwrap_or(1));
    if page >= pagination.total_pages {
        return None;
    }

    Some(format!(
        "Showing page {} of {} ({} events in total). Use --page {} to see more.",
        page,
        pagination.total_pages,
        pagination.total_results,
        page + 1
    ))
}

/// Events as pretty-printed JSON
pub fn events_json(events: &[AuditEvent]) -> Result<String> {
    Ok(serde_json::to_string_pretty(events)?)
}
