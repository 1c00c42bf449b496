//! Cloud Foundry v3 API client
//!
//! Issues authenticated GET requests and decodes JSON envelopes. One request
//! per call: no retries and no pagination following.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::events::AuditEventPage;
use crate::query::AuditEventFilter;
use crate::session::{Organization, ServiceInstance, Space};

/// Path of the audit events listing, relative to the API base
pub const AUDIT_EVENTS_PATH: &str = "/v3/audit_events";

const ORGANIZATIONS_PATH: &str = "/v3/organizations";
const SPACES_PATH: &str = "/v3/spaces";
const SERVICE_INSTANCES_PATH: &str = "/v3/service_instances";

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,

    /// Request timeout; `None` keeps the client default
    pub timeout: Option<Duration>,

    /// Accept invalid TLS certificates (mirrors `cf api --skip-ssl-validation`)
    pub skip_ssl_validation: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("cf-audit/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
            skip_ssl_validation: false,
        }
    }
}

/// Generic `{ resources: [...] }` listing envelope
#[derive(Debug, Deserialize)]
struct ResourceList<T> {
    #[serde(default = "Vec::new")]
    resources: Vec<T>,
}

/// CF v3 error envelope
#[derive(Debug, Deserialize)]
struct ApiErrors {
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    detail: String,
    #[serde(default)]
    title: String,
}

/// Authenticated client bound to one API endpoint
#[derive(Debug, Clone)]
pub struct CfApiClient {
    http: reqwest::Client,
    api_base: Url,
    authorization: String,
}

impl CfApiClient {
    /// Create a client for `api_base` (e.g. `https://api.example.com`)
    pub fn new(api_base: &str, access_token: &str, config: &ClientConfig) -> Result<Self> {
        let api_base = Url::parse(api_base).map_err(|e| AuditError::InvalidEndpoint {
            url: api_base.to_string(),
            reason: e.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(AuditError::InvalidEndpoint {
                url: api_base.to_string(),
                reason: "not an http(s) URL".to_string(),
            });
        }

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if config.skip_ssl_validation {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(AuditError::ClientBuild)?;

        Ok(Self {
            http,
            api_base,
            authorization: authorization_value(access_token),
        })
    }

    /// Resolve `path` against the API base and attach the query pairs
    pub fn endpoint(&self, path: &str, pairs: &[(&str, String)]) -> Url {
        let mut url = self.api_base.clone();
        let base_path = self.api_base.path().trim_end_matches('/');
        url.set_path(&format!("{base_path}{path}"));
        url.set_query(None);

        if !pairs.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(pairs.iter().map(|(key, value)| (*key, value.as_str())));
        }

        url
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path, pairs);
        let url_string = url.to_string();
        debug!(url = %url_string, "GET");

        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.authorization)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| AuditError::Transport {
                url: url_string.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| AuditError::Transport {
                url: url_string.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(AuditError::Api {
                status: status.as_u16(),
                url: url_string,
                detail: api_error_detail(&body, status.canonical_reason()),
            });
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AuditError::EmptyResponse { url: url_string });
        }

        serde_json::from_slice(&body).map_err(|source| AuditError::Decode {
            url: url_string,
            source,
        })
    }

    /// Fetch one page of audit events matching `filter`
    pub async fn list_audit_events(&self, filter: &AuditEventFilter) -> Result<AuditEventPage> {
        let page: AuditEventPage = self
            .get_json(AUDIT_EVENTS_PATH, &filter.query_pairs())
            .await?;

        debug!(
            returned = page.resources.len(),
            total = page.pagination.total_results,
            "Fetched audit events"
        );

        Ok(page)
    }

    pub async fn find_organization(&self, name: &str) -> Result<Option<Organization>> {
        self.find_first(ORGANIZATIONS_PATH, vec![("names", name.to_string())])
            .await
    }

    pub async fn find_space(&self, org_guid: &str, name: &str) -> Result<Option<Space>> {
        self.find_first(
            SPACES_PATH,
            vec![
                ("names", name.to_string()),
                ("organization_guids", org_guid.to_string()),
            ],
        )
        .await
    }

    /// Look up a service instance by name within an org, narrowed to a space when given
    pub async fn find_service_instance(
        &self,
        org_guid: &str,
        space_guid: Option<&str>,
        name: &str,
    ) -> Result<Option<ServiceInstance>> {
        let mut pairs = vec![
            ("names", name.to_string()),
            ("organization_guids", org_guid.to_string()),
        ];
        if let Some(space_guid) = space_guid {
            pairs.push(("space_guids", space_guid.to_string()));
        }

        self.find_first(SERVICE_INSTANCES_PATH, pairs).await
    }

    async fn find_first<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: Vec<(&str, String)>,
    ) -> Result<Option<T>> {
        let list: ResourceList<T> = self.get_json(path, &pairs).await?;
        Ok(list.resources.into_iter().next())
    }
}

/// Header value for a stored token; the cf CLI stores it with its scheme
fn authorization_value(access_token: &str) -> String {
    let token = access_token.trim();
    let has_scheme = token
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "));

    if has_scheme {
        token.to_string()
    } else {
        format!("bearer {token}")
    }
}

/// Human-readable detail for a failed response
fn api_error_detail(body: &[u8], reason: Option<&str>) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ApiErrors>(body) {
        let details: Vec<String> = parsed
            .errors
            .into_iter()
            .map(|e| if e.detail.is_empty() { e.title } else { e.detail })
            .filter(|d| !d.is_empty())
            .collect();
        if !details.is_empty() {
            return details.join("; ");
        }
    }

    reason.unwrap_or("request failed").to_string()
}
