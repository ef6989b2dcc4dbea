//! Remote provider integration: the `MailApi` seam, its Resend implementation
//! and the background engine the UI talks to.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use hypermail_core::{Searchable, log_debug};

mod resend;

pub use resend::{
    ApiErrorBody, DEFAULT_API_BASE, ResendClient, api_base, api_error_message, classify_key_check,
    parse_api_error, validate_api_key,
};

const MAIL_CMD_QUEUE_CAPACITY: usize = 64;
const MAIL_EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Folder {
    Inbox,
    Sent,
}

impl Folder {
    pub fn label(self) -> &'static str {
        match self {
            Folder::Inbox => "Inbox",
            Folder::Sent => "Sent",
        }
    }
}

fn nullable_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

fn one_or_many<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(de)? {
        Some(OneOrMany::One(addr)) => vec![addr],
        Some(OneOrMany::Many(addrs)) => addrs,
        None => Vec::new(),
    })
}

/// A message as returned by the provider. List endpoints leave the bodies empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteMessage {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub from: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub to: Vec<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub subject: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,
    #[serde(default)]
    pub last_event: Option<String>,
}

impl RemoteMessage {
    pub fn to_line(&self) -> String {
        self.to.join(", ")
    }

    /// Local `YYYY-MM-DD HH:MM`, or the raw value when it does not parse.
    pub fn display_date(&self) -> String {
        parse_timestamp(&self.created_at)
            .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| self.created_at.clone())
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<chrono::FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .or_else(|| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z").ok())
}

impl Searchable for RemoteMessage {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.from.as_str(), self.subject.as_str()];
        fields.extend(self.to.iter().map(String::as_str));
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl Domain {
    pub fn is_verified(&self) -> bool {
        self.status == "verified"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiKeyInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub created_at: String,
}

#[async_trait]
pub trait MailApi: Send + Sync {
    async fn send_email(&self, req: &SendRequest) -> Result<String>;
    async fn list_received(&self) -> Result<Vec<RemoteMessage>>;
    async fn get_received(&self, id: &str) -> Result<RemoteMessage>;
    async fn list_sent(&self) -> Result<Vec<RemoteMessage>>;
    async fn get_sent(&self, id: &str) -> Result<RemoteMessage>;
    async fn list_domains(&self) -> Result<Vec<Domain>>;
    async fn list_api_keys(&self) -> Result<Vec<ApiKeyInfo>>;
    async fn validate_key(&self, candidate: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub enum MailCommand {
    ListReceived,
    ListSent,
    FetchReceived { id: String },
    FetchSent { id: String },
    Send(SendRequest),
    ListDomains,
    ListApiKeys,
    ValidateKey { candidate: String },
}

#[derive(Debug, Clone)]
pub enum MailEvent {
    MessagesLoaded {
        folder: Folder,
        result: Result<Vec<RemoteMessage>, String>,
    },
    MessageLoaded {
        folder: Folder,
        id: String,
        result: Result<RemoteMessage, String>,
    },
    SendCompleted {
        id: String,
    },
    SendFailed {
        reason: String,
    },
    DomainsLoaded(Result<Vec<Domain>, String>),
    ApiKeysLoaded(Result<Vec<ApiKeyInfo>, String>),
    KeyValidated {
        candidate: String,
        result: Result<bool, String>,
    },
}

fn flatten_err<T>(result: Result<T>) -> Result<T, String> {
    result.map_err(|err| {
        log_debug(&format!("remote call failed: {:#}", err));
        err.to_string()
    })
}

async fn run_command(api: Arc<dyn MailApi>, cmd: MailCommand) -> MailEvent {
    match cmd {
        MailCommand::ListReceived => MailEvent::MessagesLoaded {
            folder: Folder::Inbox,
            result: flatten_err(api.list_received().await),
        },
        MailCommand::ListSent => MailEvent::MessagesLoaded {
            folder: Folder::Sent,
            result: flatten_err(api.list_sent().await),
        },
        MailCommand::FetchReceived { id } => {
            let result = flatten_err(api.get_received(&id).await);
            MailEvent::MessageLoaded {
                folder: Folder::Inbox,
                id,
                result,
            }
        }
        MailCommand::FetchSent { id } => {
            let result = flatten_err(api.get_sent(&id).await);
            MailEvent::MessageLoaded {
                folder: Folder::Sent,
                id,
                result,
            }
        }
        MailCommand::Send(req) => match api.send_email(&req).await {
            Ok(id) => MailEvent::SendCompleted { id },
            Err(err) => {
                log_debug(&format!("send failed: {:#}", err));
                MailEvent::SendFailed {
                    reason: err.to_string(),
                }
            }
        },
        MailCommand::ListDomains => MailEvent::DomainsLoaded(flatten_err(api.list_domains().await)),
        MailCommand::ListApiKeys => {
            MailEvent::ApiKeysLoaded(flatten_err(api.list_api_keys().await))
        }
        MailCommand::ValidateKey { candidate } => {
            let result = flatten_err(api.validate_key(&candidate).await);
            MailEvent::KeyValidated { candidate, result }
        }
    }
}

/// Background worker. Every command runs as its own task, so two overlapping
/// refreshes both report and the later event wins in the UI.
#[derive(Clone)]
pub struct MailEngine {
    tx: mpsc::Sender<MailCommand>,
}

impl MailEngine {
    pub fn start(api: Arc<dyn MailApi>) -> (Self, mpsc::Receiver<MailEvent>) {
        let (cmd_tx, mut cmd_rx) = mpsc::channel::<MailCommand>(MAIL_CMD_QUEUE_CAPACITY);
        let (evt_tx, evt_rx) = mpsc::channel::<MailEvent>(MAIL_EVENT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(cmd) = cmd_rx.recv().await {
                let api = api.clone();
                let tx = evt_tx.clone();
                tokio::spawn(async move {
                    let event = run_command(api, cmd).await;
                    if tx.send(event).await.is_err() {
                        log_debug("mail event receiver dropped");
                    }
                });
            }
        });

        (Self { tx: cmd_tx }, evt_rx)
    }

    pub fn send(&self, cmd: MailCommand) -> Result<()> {
        match self.tx.try_send(cmd) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(cmd)) => {
                log_debug(&format!("mail cmd queue full, dropping: {:?}", cmd));
                Err(anyhow!("mail command queue full"))
            }
            Err(TrySendError::Closed(_)) => Err(anyhow!("mail command queue closed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::{
        ApiKeyInfo, Domain, Folder, MailApi, MailCommand, MailEngine, MailEvent, RemoteMessage,
        SendRequest,
    };
    use hypermail_core::Searchable;

    #[derive(Default)]
    struct FakeApi {
        fail: bool,
        sends: AtomicUsize,
    }

    fn message(id: &str) -> RemoteMessage {
        RemoteMessage {
            id: id.to_string(),
            from: "bob@example.com".to_string(),
            to: vec!["me@example.com".to_string()],
            subject: format!("subject {}", id),
            ..Default::default()
        }
    }

    #[async_trait]
    impl MailApi for FakeApi {
        async fn send_email(&self, req: &SendRequest) -> Result<String> {
            if self.fail || req.to.is_empty() {
                return Err(anyhow!("Missing `to` field. (missing_required_field)"));
            }
            let n = self.sends.fetch_add(1, Ordering::SeqCst);
            Ok(format!("sent-{}", n))
        }
        async fn list_received(&self) -> Result<Vec<RemoteMessage>> {
            if self.fail {
                return Err(anyhow!("boom"));
            }
            Ok(vec![message("r1"), message("r2")])
        }
        async fn get_received(&self, id: &str) -> Result<RemoteMessage> {
            let mut msg = message(id);
            msg.text = Some("hello".to_string());
            Ok(msg)
        }
        async fn list_sent(&self) -> Result<Vec<RemoteMessage>> {
            Ok(vec![message("s1")])
        }
        async fn get_sent(&self, id: &str) -> Result<RemoteMessage> {
            Ok(message(id))
        }
        async fn list_domains(&self) -> Result<Vec<Domain>> {
            Ok(vec![Domain {
                name: "example.com".to_string(),
                status: "verified".to_string(),
                ..Default::default()
            }])
        }
        async fn list_api_keys(&self) -> Result<Vec<ApiKeyInfo>> {
            Ok(Vec::new())
        }
        async fn validate_key(&self, candidate: &str) -> Result<bool> {
            Ok(candidate.starts_with("re_"))
        }
    }

    async fn next_event(rx: &mut mpsc::Receiver<MailEvent>) -> MailEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event before timeout")
            .expect("engine alive")
    }

    #[test]
    fn send_returns_error_when_queue_is_full() {
        let (tx, _rx) = mpsc::channel(1);
        let engine = MailEngine { tx };
        engine.send(MailCommand::ListReceived).unwrap();

        let err = engine.send(MailCommand::ListReceived).unwrap_err();
        assert!(err.to_string().contains("queue full"));
    }

    #[test]
    fn send_returns_error_when_queue_is_closed() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let engine = MailEngine { tx };

        let err = engine.send(MailCommand::ListSent).unwrap_err();
        assert!(err.to_string().contains("queue closed"));
    }

    #[tokio::test]
    async fn engine_reports_received_list() {
        let (engine, mut rx) = MailEngine::start(Arc::new(FakeApi::default()));
        engine.send(MailCommand::ListReceived).unwrap();
        match next_event(&mut rx).await {
            MailEvent::MessagesLoaded { folder, result } => {
                assert_eq!(folder, Folder::Inbox);
                assert_eq!(result.unwrap().len(), 2);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn engine_reports_failures_as_strings() {
        let api = FakeApi {
            fail: true,
            ..Default::default()
        };
        let (engine, mut rx) = MailEngine::start(Arc::new(api));
        engine.send(MailCommand::ListReceived).unwrap();
        match next_event(&mut rx).await {
            MailEvent::MessagesLoaded { result, .. } => assert_eq!(result.unwrap_err(), "boom"),
            other => panic!("unexpected event {:?}", other),
        }
        engine
            .send(MailCommand::Send(SendRequest {
                to: vec!["a@example.com".to_string()],
                ..Default::default()
            }))
            .unwrap();
        match next_event(&mut rx).await {
            MailEvent::SendFailed { reason } => assert!(reason.contains("missing_required_field")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn engine_sends_and_validates() {
        let (engine, mut rx) = MailEngine::start(Arc::new(FakeApi::default()));
        engine
            .send(MailCommand::Send(SendRequest {
                from: "me@example.com".to_string(),
                to: vec!["a@example.com".to_string()],
                subject: "Hi".to_string(),
                text: Some("body".to_string()),
                html: None,
            }))
            .unwrap();
        match next_event(&mut rx).await {
            MailEvent::SendCompleted { id } => assert_eq!(id, "sent-0"),
            other => panic!("unexpected event {:?}", other),
        }

        engine
            .send(MailCommand::ValidateKey {
                candidate: "nope".to_string(),
            })
            .unwrap();
        match next_event(&mut rx).await {
            MailEvent::KeyValidated { candidate, result } => {
                assert_eq!(candidate, "nope");
                assert_eq!(result, Ok(false));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn engine_fetches_detail_with_id() {
        let (engine, mut rx) = MailEngine::start(Arc::new(FakeApi::default()));
        engine
            .send(MailCommand::FetchReceived {
                id: "r7".to_string(),
            })
            .unwrap();
        match next_event(&mut rx).await {
            MailEvent::MessageLoaded { folder, id, result } => {
                assert_eq!(folder, Folder::Inbox);
                assert_eq!(id, "r7");
                assert_eq!(result.unwrap().text.as_deref(), Some("hello"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn message_search_covers_recipients() {
        let msg = message("x");
        assert!(msg.matches("me@example"));
        assert!(msg.matches("subject x"));
        assert!(!msg.matches("nobody"));
    }

    #[test]
    fn display_date_handles_provider_formats() {
        let mut msg = message("d");
        msg.created_at = "not a date".to_string();
        assert_eq!(msg.display_date(), "not a date");
        msg.created_at = "2024-05-01 10:00:00.123456+00".to_string();
        assert_eq!(msg.display_date().len(), "2024-05-01 10:00".len());
        msg.created_at = "2024-05-15T10:00:00Z".to_string();
        assert!(msg.display_date().starts_with("2024-05-1"));
    }
}
