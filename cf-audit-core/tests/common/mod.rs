//! Test helpers shared by the integration tests
//!
//! `MockApi` is a minimal HTTP/1.1 responder on a local port: it serves the
//! canned responses in order, one per connection, and records each request
//! line and its headers.

#![allow(dead_code)]

use async_trait::async_trait;
use cf_audit_core::session::{Organization, ServiceInstance, Session, Space};
use cf_audit_core::{AuditError, Result};
use std::sync::Once;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A response the mock API will send
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
}

impl CannedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// What the mock API received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or_default()
    }

    /// Decoded query parameters
    pub fn query(&self) -> Vec<(String, String)> {
        let url = reqwest::Url::parse(&format!("http://localhost{}", self.target)).unwrap();
        url.query_pairs().into_owned().collect()
    }

    pub fn query_value(&self, key: &str) -> Option<String> {
        self.query()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

pub struct MockApi {
    pub base_url: String,
    handle: JoinHandle<Vec<RecordedRequest>>,
}

impl MockApi {
    /// Serve `responses` in order, one connection each
    pub async fn serve(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let mut recorded = Vec::new();

            for response in responses {
                let (mut stream, _) = listener.accept().await.unwrap();

                let mut buffer = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                    let read = stream.read(&mut chunk).await.unwrap();
                    if read == 0 {
                        break;
                    }
                    buffer.extend_from_slice(&chunk[..read]);
                }
                recorded.push(parse_request(&buffer));

                let reply = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    if response.status < 400 { "OK" } else { "Error" },
                    response.body.len(),
                    response.body
                );
                stream.write_all(reply.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }

            recorded
        });

        Self { base_url, handle }
    }

    /// Wait for every canned response to be served and return the requests
    pub async fn requests(self) -> Vec<RecordedRequest> {
        self.handle.await.unwrap()
    }
}

fn parse_request(raw: &[u8]) -> RecordedRequest {
    let text = String::from_utf8_lossy(raw);
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect();

    RecordedRequest {
        method,
        target,
        headers,
    }
}

/// A URL nothing listens on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// JSON for one audit event resource
pub fn event_json(guid: &str, event_type: &str, data: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "guid": guid,
        "created_at": "2020-05-26T09:31:28Z",
        "updated_at": "2020-05-26T09:31:28Z",
        "type": event_type,
        "actor": { "guid": "user-guid", "type": "user", "name": "admin" },
        "target": { "guid": format!("target-{guid}"), "type": "service_binding", "name": "" },
        "data": data,
        "space": { "guid": "space-guid" },
        "organization": { "guid": "org-guid" },
        "links": {}
    })
}

/// JSON for a single-page listing
pub fn page_json(resources: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "pagination": {
            "total_results": resources.len(),
            "total_pages": 1,
            "first": { "href": "https://api.example.com/v3/audit_events?page=1" },
            "last": { "href": "https://api.example.com/v3/audit_events?page=1" },
            "next": null,
            "previous": null
        },
        "resources": resources
    })
    .to_string()
}

/// In-memory session for orchestration tests
#[derive(Debug, Clone)]
pub struct InMemorySession {
    pub api_base: String,
    pub current_org: Option<Organization>,
    pub current_space: Option<Space>,
    pub orgs: Vec<Organization>,
    pub spaces: Vec<(String, Space)>,
    pub services: Vec<ServiceInstance>,
    pub username: Option<String>,
}

impl InMemorySession {
    /// Targeted at `my-org` / `dev`, with a `prod` space and a `my-db` instance
    pub fn targeted(api_base: &str) -> Self {
        let org = Organization {
            guid: "org-guid".to_string(),
            name: "my-org".to_string(),
        };
        let dev = Space {
            guid: "space-guid".to_string(),
            name: "dev".to_string(),
        };
        let prod = Space {
            guid: "prod-guid".to_string(),
            name: "prod".to_string(),
        };

        Self {
            api_base: api_base.to_string(),
            current_org: Some(org.clone()),
            current_space: Some(dev.clone()),
            orgs: vec![
                org.clone(),
                Organization {
                    guid: "other-org-guid".to_string(),
                    name: "other-org".to_string(),
                },
            ],
            spaces: vec![(org.guid.clone(), dev), (org.guid, prod)],
            services: vec![ServiceInstance {
                guid: "svc-1".to_string(),
                name: "my-db".to_string(),
            }],
            username: Some("admin".to_string()),
        }
    }
}

#[async_trait]
impl Session for InMemorySession {
    async fn current_org(&self) -> Result<Organization> {
        self.current_org.clone().ok_or(AuditError::NotTargeted {
            kind: "org",
            flag: "-o",
        })
    }

    async fn current_space(&self) -> Result<Space> {
        self.current_space.clone().ok_or(AuditError::NotTargeted {
            kind: "space",
            flag: "-s",
        })
    }

    async fn org_by_name(&self, name: &str) -> Result<Organization> {
        self.orgs
            .iter()
            .find(|o| o.name == name)
            .cloned()
            .ok_or_else(|| AuditError::lookup("Organization", name))
    }

    async fn space_by_name(&self, org: &Organization, name: &str) -> Result<Space> {
        self.spaces
            .iter()
            .find(|(org_guid, space)| *org_guid == org.guid && space.name == name)
            .map(|(_, space)| space.clone())
            .ok_or_else(|| AuditError::lookup("Space", name))
    }

    async fn service_by_name(
        &self,
        _org: &Organization,
        _space: Option<&Space>,
        name: &str,
    ) -> Result<ServiceInstance> {
        self.services
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| AuditError::lookup("Service instance", name))
    }

    async fn access_token(&self) -> Result<String> {
        Ok("bearer test-token".to_string())
    }

    async fn username(&self) -> Result<String> {
        self.username.clone().ok_or(AuditError::Session {
            path: "memory".into(),
            reason: "no user".to_string(),
        })
    }

    async fn api_base(&self) -> Result<String> {
        Ok(self.api_base.clone())
    }
}
