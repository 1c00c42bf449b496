//! Session backed by the cf CLI config file
//!
//! The cf CLI keeps its login state in `$CF_HOME/.cf/config.json`
//! (`~/.cf/config.json` when `CF_HOME` is unset). Targeted org and space,
//! API endpoint and access token come from that file; name lookups go to the
//! v3 API with the stored token.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{Organization, ServiceInstance, Session, Space};
use crate::client::{CfApiClient, ClientConfig};
use crate::error::{AuditError, Result};

/// Subset of the cf CLI config file this crate reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfConfig {
    /// API endpoint, e.g. `https://api.example.com`
    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub organization_fields: NamedFields,

    #[serde(default)]
    pub space_fields: NamedFields,

    #[serde(default, rename = "SSLDisabled")]
    pub ssl_disabled: bool,
}

/// `{ "GUID": ..., "Name": ... }` as written by the cf CLI
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamedFields {
    #[serde(default, rename = "GUID")]
    pub guid: String,

    #[serde(default, rename = "Name")]
    pub name: String,
}

impl CfConfig {
    /// Load and parse the config file at `path`
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::Session {
            path: path.to_path_buf(),
            reason: format!("failed to read config: {e}"),
        })?;

        serde_json::from_str(&content).map_err(|e| AuditError::Session {
            path: path.to_path_buf(),
            reason: format!("failed to parse config: {e}"),
        })
    }
}

/// Location of the cf CLI config file
///
/// `cf_home` wins, then the `CF_HOME` environment variable, then the home
/// directory.
pub fn cf_config_path(cf_home: Option<&Path>) -> Result<PathBuf> {
    let home = match cf_home {
        Some(dir) => dir.to_path_buf(),
        None => std::env::var_os("CF_HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .ok_or_else(|| AuditError::Session {
                path: PathBuf::from("~/.cf/config.json"),
                reason: "could not determine home directory".to_string(),
            })?,
    };

    Ok(home.join(".cf").join("config.json"))
}

/// [`Session`] implementation over the cf CLI config file
pub struct CfConfigSession {
    config: CfConfig,
    config_path: PathBuf,
    client: CfApiClient,
}

impl CfConfigSession {
    /// Load the session from the cf CLI config under `cf_home`
    pub fn load(cf_home: Option<&Path>, client_config: &ClientConfig) -> Result<Self> {
        let config_path = cf_config_path(cf_home)?;
        debug!("Loading cf CLI config from {}", config_path.display());

        let config = CfConfig::load_from_path(&config_path)?;
        Self::new(config, config_path, client_config)
    }

    /// Build a session from an already parsed config
    pub fn new(
        config: CfConfig,
        config_path: PathBuf,
        client_config: &ClientConfig,
    ) -> Result<Self> {
        if config.target.is_empty() {
            return Err(AuditError::Session {
                path: config_path,
                reason: "no API endpoint set, run 'cf api' and 'cf login' first".to_string(),
            });
        }
        if config.access_token.trim().is_empty() {
            return Err(AuditError::Session {
                path: config_path,
                reason: "not logged in, run 'cf login' first".to_string(),
            });
        }

        if config.ssl_disabled {
            warn!("SSL validation is disabled for {}", config.target);
        }
        let mut client_config = client_config.clone();
        client_config.skip_ssl_validation |= config.ssl_disabled;
        let client = CfApiClient::new(&config.target, &config.access_token, &client_config)?;

        Ok(Self {
            config,
            config_path,
            client,
        })
    }

    pub fn config(&self) -> &CfConfig {
        &self.config
    }

    /// Client bound to the config's target and token
    pub fn client(&self) -> &CfApiClient {
        &self.client
    }
}

#[async_trait]
impl Session for CfConfigSession {
    async fn current_org(&self) -> Result<Organization> {
        let fields = &self.config.organization_fields;
        if fields.guid.is_empty() {
            return Err(AuditError::NotTargeted {
                kind: "org",
                flag: "-o",
            });
        }

        Ok(Organization {
            guid: fields.guid.clone(),
            name: fields.name.clone(),
        })
    }

    async fn current_space(&self) -> Result<Space> {
        let fields = &self.config.space_fields;
        if fields.guid.is_empty() {
            return Err(AuditError::NotTargeted {
                kind: "space",
                flag: "-s",
            });
        }

        Ok(Space {
            guid: fields.guid.clone(),
            name: fields.name.clone(),
        })
    }

    async fn org_by_name(&self, name: &str) -> Result<Organization> {
        self.client
            .find_organization(name)
            .await?
            .ok_or_else(|| AuditError::lookup("Organization", name))
    }

    async fn space_by_name(&self, org: &Organization, name: &str) -> Result<Space> {
        self.client
            .find_space(&org.guid, name)
            .await?
            .ok_or_else(|| AuditError::lookup("Space", name))
    }

    async fn service_by_name(
        &self,
        org: &Organization,
        space: Option<&Space>,
        name: &str,
    ) -> Result<ServiceInstance> {
        self.client
            .find_service_instance(&org.guid, space.map(|s| s.guid.as_str()), name)
            .await?
            .ok_or_else(|| AuditError::lookup("Service instance", name))
    }

    async fn access_token(&self) -> Result<String> {
        Ok(self.config.access_token.clone())
    }

    async fn username(&self) -> Result<String> {
        username_from_token(&self.config.access_token).ok_or_else(|| AuditError::Session {
            path: self.config_path.clone(),
            reason: "access token carries no user name".to_string(),
        })
    }

    async fn api_base(&self) -> Result<String> {
        Ok(self.config.target.clone())
    }
}

/// Claims the cf CLI reads to show who is logged in
#[derive(Debug, Deserialize)]
struct TokenClaims {
    #[serde(default)]
    user_name: Option<String>,

    #[serde(default)]
    client_id: Option<String>,
}

/// Extract the user name from a (possibly `bearer `-prefixed) JWT
///
/// Client-credential tokens carry no user, so the client id stands in.
fn username_from_token(access_token: &str) -> Option<String> {
    let token = access_token.trim();
    let jwt = token
        .split_once(' ')
        .map(|(_, rest)| rest.trim())
        .unwrap_or(token);

    let claims_segment = jwt.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(claims_segment.trim_end_matches('='))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;

    claims.user_name.or(claims.client_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn token_with_claims(claims: &str) -> String {
        format!(
            "bearer {}.{}.signature",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let cf_dir = dir.path().join(".cf");
        std::fs::create_dir_all(&cf_dir).unwrap();
        let path = cf_dir.join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn full_config(token: &str) -> String {
        serde_json::json!({
            "ConfigVersion": 3,
            "Target": "https://api.example.com",
            "APIVersion": "2.150.0",
            "AccessToken": token,
            "RefreshToken": "refresh",
            "OrganizationFields": { "GUID": "org-guid", "Name": "my-org" },
            "SpaceFields": { "GUID": "space-guid", "Name": "dev", "AllowSSH": true },
            "SSLDisabled": true
        })
        .to_string()
    }

    #[test]
    fn test_config_path_prefers_explicit_home() {
        let path = cf_config_path(Some(Path::new("/tmp/cfhome"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/cfhome/.cf/config.json"));
    }

    #[tokio::test]
    async fn test_load_targeted_session() {
        let temp_dir = TempDir::new().unwrap();
        let token = token_with_claims(r#"{"user_name":"admin","user_id":"u-1"}"#);
        write_config(&temp_dir, &full_config(&token));

        let session =
            CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default()).unwrap();

        assert!(session.config().ssl_disabled);
        assert_eq!(
            session.current_org().await.unwrap(),
            Organization {
                guid: "org-guid".to_string(),
                name: "my-org".to_string()
            }
        );
        assert_eq!(session.current_space().await.unwrap().name, "dev");
        assert_eq!(session.username().await.unwrap(), "admin");
        assert_eq!(session.api_base().await.unwrap(), "https://api.example.com");
        assert_eq!(session.access_token().await.unwrap(), token);
        assert_eq!(
            session.client().endpoint("/v3/audit_events", &[]).as_str(),
            "https://api.example.com/v3/audit_events"
        );
    }

    #[tokio::test]
    async fn test_untargeted_org_and_space() {
        let temp_dir = TempDir::new().unwrap();
        let config = serde_json::json!({
            "Target": "https://api.example.com",
            "AccessToken": token_with_claims(r#"{"user_name":"admin"}"#),
            "OrganizationFields": { "GUID": "", "Name": "" },
            "SpaceFields": { "GUID": "", "Name": "" }
        });
        write_config(&temp_dir, &config.to_string());

        let session =
            CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default()).unwrap();

        let org_err = session.current_org().await.unwrap_err();
        assert!(matches!(org_err, AuditError::NotTargeted { kind: "org", .. }));
        assert!(org_err.to_string().contains("cf target -o"));

        let space_err = session.current_space().await.unwrap_err();
        assert!(matches!(space_err, AuditError::NotTargeted { kind: "space", .. }));
    }

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();

        let result = CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default());

        match result {
            Err(AuditError::Session { path, reason }) => {
                assert!(path.ends_with(".cf/config.json"));
                assert!(reason.contains("failed to read"));
            }
            Err(other) => panic!("expected session error, got {other:?}"),
            Ok(_) => panic!("expected session error"),
        }
    }

    #[test]
    fn test_invalid_config_json() {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir, "{ not json");

        let result = CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default());
        assert!(matches!(result, Err(AuditError::Session { .. })));
    }

    #[test]
    fn test_not_logged_in() {
        let temp_dir = TempDir::new().unwrap();
        write_config(
            &temp_dir,
            r#"{"Target": "https://api.example.com", "AccessToken": ""}"#,
        );

        let err = CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("cf login"));
    }

    #[test]
    fn test_no_api_endpoint() {
        let temp_dir = TempDir::new().unwrap();
        write_config(&temp_dir, r#"{"AccessToken": "bearer x.y.z"}"#);

        let err = CfConfigSession::load(Some(temp_dir.path()), &ClientConfig::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("cf api"));
    }

    #[test]
    fn test_username_from_token() {
        let user = token_with_claims(r#"{"user_name":"jane@example.com"}"#);
        assert_eq!(username_from_token(&user).as_deref(), Some("jane@example.com"));

        let client = token_with_claims(r#"{"client_id":"ci-pipeline"}"#);
        assert_eq!(username_from_token(&client).as_deref(), Some("ci-pipeline"));

        let bare = URL_SAFE_NO_PAD.encode(r#"{"user_name":"bob"}"#);
        assert_eq!(
            username_from_token(&format!("header.{bare}.sig")).as_deref(),
            Some("bob")
        );

        assert_eq!(username_from_token("bearer not-a-jwt"), None);
        assert_eq!(username_from_token(""), None);
    }
}
