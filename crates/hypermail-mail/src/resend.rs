//! HTTP client for the Resend REST API.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use hypermail_core::log_debug;

use crate::{ApiKeyInfo, Domain, MailApi, RemoteMessage, SendRequest};

pub const DEFAULT_API_BASE: &str = "https://api.resend.com";

/// `HYPERMAIL_API_BASE` when set, otherwise the public endpoint.
pub fn api_base() -> String {
    std::env::var("HYPERMAIL_API_BASE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
        .trim_end_matches('/')
        .to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

pub fn parse_api_error(body: &str) -> Option<ApiErrorBody> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .filter(|err| !err.message.is_empty() || !err.name.is_empty())
}

/// `<message> (<name>)` from a provider error body, or the bare status.
pub fn api_error_message(status: u16, body: &str) -> String {
    match parse_api_error(body) {
        Some(err) if err.name.is_empty() => err.message,
        Some(err) if err.message.is_empty() => err.name,
        Some(err) => format!("{} ({})", err.message, err.name),
        None if body.trim().is_empty() => format!("HTTP {}", status),
        None => format!("HTTP {}: {}", status, body.trim()),
    }
}

/// `Some(valid)` for an authoritative answer, `None` when the check itself failed.
pub fn classify_key_check(status: u16, body: &str) -> Option<bool> {
    if (200..300).contains(&status) {
        return Some(true);
    }
    // Send-only keys authenticate but may not list domains.
    if parse_api_error(body).is_some_and(|err| err.name == "restricted_api_key") {
        return Some(true);
    }
    match status {
        429 => None,
        400..=499 => Some(false),
        _ => None,
    }
}

pub async fn validate_api_key(base: &str, candidate: &str) -> Result<bool> {
    let response = Client::new()
        .get(format!("{}/domains", base))
        .bearer_auth(candidate.trim())
        .send()
        .await?;
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    classify_key_check(status, &body).ok_or_else(|| anyhow!(api_error_message(status, &body)))
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedResponse {
    id: String,
}

#[derive(Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

#[derive(Clone)]
pub struct ResendClient {
    http: Client,
    base: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base(api_base(), api_key)
    }

    pub fn with_base(base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        decode(path, response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        decode(path, response).await
    }
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        let message = api_error_message(status.as_u16(), &body);
        log_debug(&format!("resend {} failed: {}", path, message));
        return Err(anyhow!(message));
    }
    serde_json::from_str(&body).with_context(|| format!("decode {}", path))
}

#[async_trait]
impl MailApi for ResendClient {
    async fn send_email(&self, req: &SendRequest) -> Result<String> {
        let body = SendBody {
            from: &req.from,
            to: &req.to,
            subject: &req.subject,
            text: req.text.as_deref(),
            html: req.html.as_deref(),
        };
        let created: CreatedResponse = self.post_json("/emails", &body).await?;
        Ok(created.id)
    }

    async fn list_received(&self) -> Result<Vec<RemoteMessage>> {
        let list: ListResponse<RemoteMessage> = self.get_json("/emails/receiving").await?;
        Ok(list.data)
    }

    async fn get_received(&self, id: &str) -> Result<RemoteMessage> {
        self.get_json(&format!("/emails/receiving/{}", id)).await
    }

    async fn list_sent(&self) -> Result<Vec<RemoteMessage>> {
        let list: ListResponse<RemoteMessage> = self.get_json("/emails").await?;
        Ok(list.data)
    }

    async fn get_sent(&self, id: &str) -> Result<RemoteMessage> {
        self.get_json(&format!("/emails/{}", id)).await
    }

    async fn list_domains(&self) -> Result<Vec<Domain>> {
        let list: ListResponse<Domain> = self.get_json("/domains").await?;
        Ok(list.data)
    }

    async fn list_api_keys(&self) -> Result<Vec<ApiKeyInfo>> {
        let list: ListResponse<ApiKeyInfo> = self.get_json("/api-keys").await?;
        Ok(list.data)
    }

    async fn validate_key(&self, candidate: &str) -> Result<bool> {
        validate_api_key(&self.base, candidate).await
    }
}
