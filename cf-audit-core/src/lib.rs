//! cf-audit core library
//!
//! Queries the Cloud Foundry `/v3/audit_events` API and narrows the results
//! by org, space, service instance or event type.
//!
//! # Architecture
//!
//! ```text
//! ScopeArgs + EventQuery
//!        │  resolve through Session (cf CLI config + v3 name lookups)
//!        ▼
//! AuditEventFilter ──► query pairs ──► GET /v3/audit_events
//!        │
//!        ▼
//! AuditEventPage ──► binding payload filter (binding queries only)
//!        │
//!        ▼
//! AuditReport (rendered by the CLI)
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod filter;
pub mod query;
pub mod report;
pub mod session;

pub use client::{CfApiClient, ClientConfig};
pub use error::{AuditError, Result};
pub use events::{AuditEvent, AuditEventPage, EventPayload, Pagination};
pub use query::AuditEventFilter;
pub use report::{AuditReport, EventQuery, QueryOptions, Scope, ScopeArgs};
pub use session::{CfConfigSession, Session};
