//! Audit event commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use cf_audit_core::report::run_query;
use cf_audit_core::{AuditReport, CfConfigSession, ClientConfig, EventQuery, QueryOptions, ScopeArgs};

use crate::output;

#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recent audit events in the targeted org and space
    AuditEvents {
        #[clap(flatten)]
        scope: ScopeFlags,

        /// Only show events of these types (comma-separated, e.g. audit.app.start,audit.app.stop)
        #[clap(long = "type", value_delimiter = ',', value_name = "TYPE")]
        types: Vec<String>,

        #[clap(flatten)]
        query: QueryFlags,
    },

    /// Show audit events targeting a service instance
    ServiceEvents {
        /// Name of the service instance
        #[clap(value_name = "SERVICE_NAME")]
        service_name: String,

        #[clap(flatten)]
        scope: ScopeFlags,

        #[clap(flatten)]
        query: QueryFlags,
    },

    /// Show bind and unbind events for a service instance
    ServiceBindingEvents {
        /// Name of the service instance
        #[clap(value_name = "SERVICE_NAME")]
        service_name: String,

        #[clap(flatten)]
        scope: ScopeFlags,

        #[clap(flatten)]
        query: QueryFlags,
    },
}

/// `-o` / `-s`
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFlags {
    /// Organization to query (defaults to the targeted org)
    #[clap(short = 'o', long = "org", value_name = "ORG")]
    pub org: Option<String>,

    /// Space to query (defaults to the targeted space)
    #[clap(short = 's', long = "space", value_name = "SPACE")]
    pub space: Option<String>,
}

impl From<ScopeFlags> for ScopeArgs {
    fn from(flags: ScopeFlags) -> Self {
        ScopeArgs {
            org: flags.org,
            space: flags.space,
        }
    }
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFlags {
    /// Sort field, prefix with '-' for descending
    #[clap(long, value_name = "FIELD")]
    pub order_by: Option<String>,

    /// Page to show
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: Option<u32>,

    /// Events per page
    #[clap(long, value_parser = clap::value_parser!(u32).range(1..=5000))]
    pub per_page: Option<u32>,

    /// Print events as JSON instead of a table
    #[clap(long)]
    pub json: bool,
}

impl QueryFlags {
    fn options(&self) -> QueryOptions {
        QueryOptions {
            page: self.page,
            per_page: self.per_page,
            order_by: self.order_by.clone(),
        }
    }
}

/// Settings shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalSettings {
    pub cf_home: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl AuditCommand {
    /// Split into what to query, where, and how to show it
    fn into_parts(self) -> (EventQuery, ScopeArgs, QueryFlags) {
        match self {
            AuditCommand::AuditEvents {
                scope,
                types,
                query,
            } => (EventQuery::All { types }, scope.into(), query),
            AuditCommand::ServiceEvents {
                service_name,
                scope,
                query,
            } => (
                EventQuery::Service { name: service_name },
                scope.into(),
                query,
            ),
            AuditCommand::ServiceBindingEvents {
                service_name,
                scope,
                query,
            } => (
                EventQuery::ServiceBindings { name: service_name },
                scope.into(),
                query,
            ),
        }
    }

    pub async fn execute(self, settings: &GlobalSettings) -> Result<()> {
        let (event_query, scope, flags) = self.into_parts();
        debug!("Running {:?} in scope {:?}", event_query, scope);

        let base = ClientConfig {
            timeout: settings.timeout,
            ..Default::default()
        };
        let session = CfConfigSession::load(settings.cf_home.as_deref(), &base)
            .context("Failed to load the cf CLI session")?;
        let report = run_query(
            &session,
            session.client(),
            &scope,
            &event_query,
            &flags.options(),
        )
        .await?;

        print_report(&report, flags.json)
    }
}

fn print_report(report: &AuditReport, json: bool) -> Result<()> {
    if json {
        println!("{}", output::events_json(&report.events)?);
        return Ok(());
    }

    println!("{}", output::summary_line(report));
    println!();
    println!("{}", output::event_table(&report.events));

    if let Some(note) = output::paging_note(report) {
        println!();
        println!("{note}");
    }

    Ok(())
}
