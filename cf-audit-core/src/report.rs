//! Command orchestration
//!
//! One linear pass per invocation: resolve the org/space scope, look up the
//! service instance when the query names one, build the filter, fetch a single
//! page and narrow it client-side for binding queries.

use std::collections::HashMap;
use tracing::debug;

use crate::client::CfApiClient;
use crate::error::{AuditError, Result};
use crate::events::{AuditEvent, Pagination};
use crate::filter::{filter_service_binding_events, SERVICE_BINDING_EVENT_TYPES};
use crate::query::AuditEventFilter;
use crate::session::{Organization, ServiceInstance, Session, Space};

/// `-o` / `-s` as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeArgs {
    pub org: Option<String>,
    pub space: Option<String>,
}

/// Resolved org and optional space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub org: Organization,

    /// `None` means every space in the org
    pub space: Option<Space>,
}

/// Which events a command asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventQuery {
    /// Everything in scope, optionally narrowed to some event types
    All { types: Vec<String> },

    /// Events whose target is the named service instance
    Service { name: String },

    /// Binding create/delete events for the named service instance
    ServiceBindings { name: String },
}

/// Paging and ordering passed through to the API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub order_by: Option<String>,
}

/// Everything the presenter needs after a query
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub filter: AuditEventFilter,
    pub scope: Scope,
    pub service: Option<ServiceInstance>,
    pub events: Vec<AuditEvent>,
    pub pagination: Pagination,

    /// `None` when the session could not tell who is logged in
    pub username: Option<String>,
}

impl AuditReport {
    /// Display names for the guids in the filter
    pub fn display_names(&self) -> HashMap<String, String> {
        let mut names = HashMap::new();

        let named = [
            Some((&self.scope.org.guid, &self.scope.org.name)),
            self.scope.space.as_ref().map(|s| (&s.guid, &s.name)),
            self.service.as_ref().map(|s| (&s.guid, &s.name)),
        ];
        for (guid, name) in named.into_iter().flatten() {
            if !name.is_empty() {
                names.insert(guid.clone(), name.clone());
            }
        }

        names
    }
}

/// Resolve `-o` / `-s` against the session
///
/// An explicit org without an explicit space covers the whole org. With no
/// flags the targeted org and space are used; a missing space target also
/// widens to the whole org.
pub async fn resolve_scope(session: &dyn Session, args: &ScopeArgs) -> Result<Scope> {
    let org = match &args.org {
        Some(name) => session.org_by_name(name).await?,
        None => session.current_org().await?,
    };

    let space = match (&args.space, &args.org) {
        (Some(name), _) => Some(session.space_by_name(&org, name).await?),
        (None, Some(_)) => None,
        (None, None) => match session.current_space().await {
            Ok(space) => Some(space),
            Err(AuditError::NotTargeted { .. }) => {
                debug!("No space targeted, querying the whole org {}", org.name);
                None
            }
            Err(e) => return Err(e),
        },
    };

    Ok(Scope { org, space })
}

/// Build the server-side filter for a resolved scope
pub fn build_filter(
    scope: &Scope,
    query: &EventQuery,
    service: Option<&ServiceInstance>,
    options: &QueryOptions,
) -> AuditEventFilter {
    let mut filter = AuditEventFilter {
        organization_guids: vec![scope.org.guid.clone()],
        space_guids: scope.space.iter().map(|s| s.guid.clone()).collect(),
        page: options.page,
        per_page: options.per_page,
        order_by: options.order_by.clone(),
        ..Default::default()
    };

    match query {
        EventQuery::All { types } => filter.types = types.clone(),
        EventQuery::Service { .. } => {
            filter.target_guids = service.iter().map(|s| s.guid.clone()).collect();
        }
        EventQuery::ServiceBindings { .. } => {
            filter.types = SERVICE_BINDING_EVENT_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect();
        }
    }

    filter
}

/// Run one query end to end
pub async fn run_query(
    session: &dyn Session,
    client: &CfApiClient,
    scope_args: &ScopeArgs,
    query: &EventQuery,
    options: &QueryOptions,
) -> Result<AuditReport> {
    let scope = resolve_scope(session, scope_args).await?;

    let service = match query {
        EventQuery::All { .. } => None,
        EventQuery::Service { name } | EventQuery::ServiceBindings { name } => Some(
            session
                .service_by_name(&scope.org, scope.space.as_ref(), name)
                .await?,
        ),
    };

    let filter = build_filter(&scope, query, service.as_ref(), options);
    let page = client.list_audit_events(&filter).await?;

    let events = match (query, &service) {
        (EventQuery::ServiceBindings { .. }, Some(instance)) => {
            filter_service_binding_events(page.resources, &instance.guid)
        }
        _ => page.resources,
    };

    let username = match session.username().await {
        Ok(name) => Some(name),
        Err(e) => {
            debug!("Could not determine username: {}", e);
            None
        }
    };

    Ok(AuditReport {
        filter,
        scope,
        service,
        events,
        pagination: page.pagination,
        username,
    })
}
