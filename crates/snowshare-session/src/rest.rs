//! Snowflake REST transport
//!
//! Speaks the legacy driver protocol: one login-request for a session
//! token, then query-request calls carrying the token. This is what the
//! official connectors do under the hood.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use snowshare_errors::{ProvisionError, Result};

use crate::{ConnectTarget, Row, Session, SessionFactory};

/// Bounded attempts for transport-level connect failures; authentication
/// rejection fails on the first response.
const CONNECT_ATTEMPTS: usize = 3;

const CLIENT_APP_ID: &str = "snowshare";
const CLIENT_APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    data: LoginData<'a>,
}

#[derive(Debug, Serialize)]
struct LoginData<'a> {
    #[serde(rename = "LOGIN_NAME")]
    login_name: &'a str,
    #[serde(rename = "PASSWORD")]
    password: &'a str,
    #[serde(rename = "ACCOUNT_NAME")]
    account_name: &'a str,
    #[serde(rename = "CLIENT_APP_ID")]
    client_app_id: &'a str,
    #[serde(rename = "CLIENT_APP_VERSION")]
    client_app_version: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<LoginResponseData>,
}

#[derive(Debug, Deserialize)]
struct LoginResponseData {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql_text: &'a str,
    sequence_id: u64,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    rowset: Option<Vec<Vec<serde_json::Value>>>,
}

/// Session factory backed by the Snowflake REST endpoints
#[derive(Debug, Default)]
pub struct RestConnector {
    base_url_override: Option<String>,
}

impl RestConnector {
    pub fn new() -> Self {
        RestConnector::default()
    }

    /// Connect to a fixed endpoint instead of deriving the host from the
    /// account identifier; used to exercise the transport locally
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        RestConnector {
            base_url_override: Some(base_url.into()),
        }
    }

    fn base_url(&self, target: &ConnectTarget) -> String {
        match &self.base_url_override {
            Some(url) => url.clone(),
            None => format!("https://{}.snowflakecomputing.com", target.account),
        }
    }
}

impl SessionFactory for RestConnector {
    fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Session>> {
        let base_url = self.base_url(target);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProvisionError::connection(target.identity(), e.to_string()))?;

        let request = LoginRequest {
            data: LoginData {
                login_name: &target.user,
                password: &target.password,
                account_name: &target.account,
                client_app_id: CLIENT_APP_ID,
                client_app_version: CLIENT_APP_VERSION,
            },
        };

        let mut last_transport_error = String::new();
        for attempt in 1..=CONNECT_ATTEMPTS {
            let response = client
                .post(format!("{base_url}/session/v1/login-request"))
                .json(&request)
                .send()
                .and_then(|r| r.json::<LoginResponse>());

            match response {
                Ok(login) => {
                    if !login.success {
                        // Authentication rejection: fail fast, never retry
                        return Err(ProvisionError::connection(
                            target.identity(),
                            login
                                .message
                                .unwrap_or_else(|| "login rejected".to_string()),
                        ));
                    }
                    let token = login.data.and_then(|d| d.token).ok_or_else(|| {
                        ProvisionError::connection(
                            target.identity(),
                            "login response carried no session token",
                        )
                    })?;
                    debug!(target = %target.identity(), "session established");
                    let mut session = RestSession {
                        client,
                        base_url,
                        token: Some(token),
                        sequence_id: 0,
                        identity: target.identity(),
                    };
                    if let Some(role) = &target.role {
                        session
                            .exec(&format!("USE ROLE {role}"))
                            .map_err(|e| {
                                ProvisionError::connection(target.identity(), e.to_string())
                            })?;
                    }
                    return Ok(Box::new(session));
                }
                Err(e) => {
                    last_transport_error = e.to_string();
                    warn!(
                        attempt,
                        error = %last_transport_error,
                        "connect attempt failed"
                    );
                }
            }
        }

        Err(ProvisionError::connection(
            target.identity(),
            format!(
                "gave up after {} attempts: {}",
                CONNECT_ATTEMPTS, last_transport_error
            ),
        ))
    }
}

/// A live REST session holding one token
pub struct RestSession {
    client: Client,
    base_url: String,
    token: Option<String>,
    sequence_id: u64,
    identity: String,
}

impl RestSession {
    fn run(&mut self, statement: &str) -> Result<QueryResponse> {
        let token = self.token.as_ref().ok_or_else(|| {
            ProvisionError::statement(statement_label(statement), "session is closed")
        })?;
        self.sequence_id += 1;
        let request = QueryRequest {
            sql_text: statement,
            sequence_id: self.sequence_id,
        };
        debug!(statement, "executing");
        let response = self
            .client
            .post(format!(
                "{}/queries/v1/query-request?requestId={}",
                self.base_url,
                Uuid::new_v4()
            ))
            .header("Authorization", format!("Snowflake Token=\"{token}\""))
            .json(&request)
            .send()
            .and_then(|r| r.json::<QueryResponse>())
            .map_err(|e| {
                ProvisionError::statement(
                    statement_label(statement),
                    format!("transport error: {e}"),
                )
            })?;

        if !response.success {
            let mut message = response
                .message
                .clone()
                .unwrap_or_else(|| "unknown remote error".to_string());
            if let Some(code) = &response.code {
                message.push_str(&format!(" (code {code})"));
            }
            return Err(ProvisionError::statement(statement_label(statement), message));
        }
        Ok(response)
    }
}

impl Session for RestSession {
    fn query(&mut self, statement: &str) -> Result<Vec<Row>> {
        let response = self.run(statement)?;
        let rowset = response.data.and_then(|d| d.rowset).unwrap_or_default();
        Ok(rowset
            .into_iter()
            .map(|row| row.into_iter().map(value_to_cell).collect())
            .collect())
    }

    fn exec(&mut self, statement: &str) -> Result<()> {
        self.run(statement).map(|_| ())
    }

    fn close(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let result = self
            .client
            .post(format!("{}/session?delete=true", self.base_url))
            .header("Authorization", format!("Snowflake Token=\"{token}\""))
            .send();
        match result {
            Ok(_) => debug!(target = %self.identity, "session closed"),
            Err(e) => warn!(target = %self.identity, error = %e, "session close failed"),
        }
    }
}

impl Drop for RestSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Label a statement for error reporting: its first line, truncated to 60
/// characters on a char boundary
fn statement_label(statement: &str) -> String {
    let line = statement.lines().next().unwrap_or("").trim();
    match line.char_indices().nth(60) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}

/// Map a JSON rowset cell to an optional string value
fn value_to_cell(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_label_truncates_first_line() {
        let stmt = "CREATE OR REPLACE SECURE VIEW A_VERY_LONG_DATABASE.A_SCHEMA.A_VIEW AS\nSELECT *";
        let label = statement_label(stmt);
        assert!(label.len() <= 63);
        assert!(label.starts_with("CREATE OR REPLACE SECURE VIEW"));
        assert!(!label.contains('\n'));
    }

    #[test]
    fn test_statement_label_multibyte_first_line() {
        let stmt = "USE ROLE РОЛЬ_АНАЛИТИКА_ПО_ДАННЫМ_КОМПАНИИ_ЕВРОПА_И_АЗИЯ_РЕГИОН";
        let label = statement_label(stmt);
        assert!(label.starts_with("USE ROLE"));
        assert!(label.ends_with("..."));
        assert_eq!(label.chars().count(), 63);
    }

    #[test]
    fn test_value_to_cell_null_and_scalars() {
        assert_eq!(value_to_cell(serde_json::Value::Null), None);
        assert_eq!(
            value_to_cell(serde_json::Value::String("42".to_string())),
            Some("42".to_string())
        );
        assert_eq!(
            value_to_cell(serde_json::json!(42)),
            Some("42".to_string())
        );
    }
}
