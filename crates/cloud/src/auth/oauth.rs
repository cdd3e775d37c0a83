//! OAuth 2.0 installed-application flow with a loopback redirect.
//!
//! The user opens the authorization URL in a browser; the provider redirects
//! to a one-shot HTTP listener on `127.0.0.1`, which captures the
//! authorization code. The code is then exchanged for an access token.

use std::collections::HashMap;
use std::path::Path;

use reqwest::Url;
use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::BearerToken;
use crate::error::{CloudError, Result};

/// Read-only access to the storage backend
pub const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
/// Access to the compute backend
pub const EARTH_ENGINE_SCOPE: &str = "https://www.googleapis.com/auth/earthengine";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration, as downloaded from the provider console.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a `client_secrets.json` document (`installed` or `web` section)
    pub fn from_json(json: &str) -> Result<Self> {
        let file: SecretsFile = serde_json::from_str(json)?;
        file.installed
            .or(file.web)
            .ok_or_else(|| CloudError::Auth("client secrets have no `installed` or `web` section".into()))
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            CloudError::Auth(format!("cannot read client secrets {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Interactive installed-application authorization.
pub struct InstalledFlow {
    secrets: ClientSecrets,
    scopes: Vec<String>,
    client: reqwest::Client,
}

impl InstalledFlow {
    pub fn new(secrets: ClientSecrets, scopes: &[&str]) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CloudError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            secrets,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            client,
        })
    }

    /// URL the user must visit to grant access
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<Url> {
        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| CloudError::Auth(format!("invalid auth_uri: {e}")))
    }

    /// Run the flow to completion and return an access token.
    pub async fn run(&self) -> Result<BearerToken> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let redirect_uri = format!("http://127.0.0.1:{}", listener.local_addr()?.port());
        let state = state_token();

        let url = self.authorization_url(&redirect_uri, &state)?;
        info!("Open this URL in a browser to authorize access:\n\n    {url}\n");

        let code = accept_redirect(&listener, &state).await?;
        self.exchange_code(&code, &redirect_uri).await
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<BearerToken> {
        let resp = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("code", code),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CloudError::Auth(format!("token exchange returned HTTP {status}: {body}")));
        }
        let token: TokenResponse = resp.json().await?;
        debug!(expires_in = ?token.expires_in, "obtained access token");
        Ok(BearerToken::new(token.access_token))
    }
}

/// Wait for the provider's redirect and return the authorization code.
///
/// Requests without a `code` parameter (favicon probes and the like) get a
/// 404 and the listener keeps waiting.
async fn accept_redirect(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut stream, _) = listener.accept().await?;
        let request = read_request_head(&mut stream).await?;

        match parse_redirect(&request, expected_state) {
            Ok(Some(code)) => {
                respond(&mut stream, "200 OK", "Authentication complete. You may close this window.").await?;
                return Ok(code);
            }
            Ok(None) => respond(&mut stream, "404 Not Found", "Not found").await?,
            Err(e) => {
                respond(&mut stream, "400 Bad Request", "Authentication failed.").await?;
                return Err(e);
            }
        }
    }
}

/// Largest request head accepted on the redirect listener
const MAX_REQUEST_HEAD: usize = 16 * 1024;

/// Read until the blank line ending the request head, across as many reads
/// as the client needs.
pub(crate) async fn read_request_head<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut head = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        if head.len() >= MAX_REQUEST_HEAD {
            return Err(CloudError::Auth("redirect request head too large".into()));
        }
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
    }
    Ok(String::from_utf8_lossy(&head).into_owned())
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Extract the authorization code from a raw redirect request.
pub(crate) fn parse_redirect(request: &str, expected_state: &str) -> Result<Option<String>> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| CloudError::Auth("malformed redirect request".into()))?;
    let url = Url::parse(&format!("http://127.0.0.1{target}"))
        .map_err(|e| CloudError::Auth(format!("malformed redirect target: {e}")))?;
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Err(CloudError::Auth(format!("authorization denied: {error}")));
    }
    let Some(code) = params.get("code") else {
        return Ok(None);
    };
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(CloudError::Auth("state mismatch in redirect".into()));
    }
    Ok(Some(code.clone()))
}

/// Unguessable anti-forgery token echoed back in the redirect
fn state_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRETS: &str = r#"{"installed":{"client_id":"id.apps","client_secret":"s3cret",
        "auth_uri":"https://accounts.example.com/auth","token_uri":"https://oauth.example.com/token",
        "redirect_uris":["http://localhost"]}}"#;

    #[test]
    fn parses_installed_secrets() {
        let secrets = ClientSecrets::from_json(SECRETS).unwrap();
        assert_eq!(secrets.client_id, "id.apps");
        assert_eq!(secrets.token_uri, "https://oauth.example.com/token");
        assert!(ClientSecrets::from_json(r#"{"other":{}}"#).is_err());
    }

    #[test]
    fn authorization_url_carries_scopes_and_state() {
        let flow = InstalledFlow::new(
            ClientSecrets::from_json(SECRETS).unwrap(),
            &[DRIVE_READONLY_SCOPE, EARTH_ENGINE_SCOPE],
        )
        .unwrap();
        let url = flow.authorization_url("http://127.0.0.1:8080", "xyz").unwrap();
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params["redirect_uri"], "http://127.0.0.1:8080");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["scope"], format!("{DRIVE_READONLY_SCOPE} {EARTH_ENGINE_SCOPE}"));
    }

    #[test]
    fn redirect_parsing() {
        let ok = "GET /?state=abc&code=4%2F0Ab HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n";
        assert_eq!(parse_redirect(ok, "abc").unwrap(), Some("4/0Ab".to_string()));

        let favicon = "GET /favicon.ico HTTP/1.1\r\n\r\n";
        assert_eq!(parse_redirect(favicon, "abc").unwrap(), None);

        let forged = "GET /?state=evil&code=x HTTP/1.1\r\n\r\n";
        assert!(parse_redirect(forged, "abc").is_err());

        let denied = "GET /?error=access_denied HTTP/1.1\r\n\r\n";
        assert!(parse_redirect(denied, "abc").is_err());
    }

    #[test]
    fn state_tokens_are_random() {
        let a = state_token();
        let b = state_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn request_head_split_across_reads() {
        let first: &[u8] = b"GET /?state=abc&co";
        let second: &[u8] = b"de=4%2F0Ab HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n";
        let mut reader = first.chain(second);

        let head = read_request_head(&mut reader).await.unwrap();
        assert_eq!(parse_redirect(&head, "abc").unwrap(), Some("4/0Ab".to_string()));
    }

    #[tokio::test]
    async fn oversized_request_head_is_rejected() {
        let junk = vec![b'a'; MAX_REQUEST_HEAD + 10];
        let mut reader = junk.as_slice();
        assert!(read_request_head(&mut reader).await.is_err());
    }
}
