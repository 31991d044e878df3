//! Short advisory text from a hosted generative model.
//!
//! Callers never see an error: every failure (no key, transport error,
//! bad status, empty or malformed body) resolves to a fixed fallback line
//! chosen by request kind and failure. Requests are not retried or cached.

use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::task::INSIGHT_TITLE_LIMIT;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsightKind {
    /// Prioritisation advice for the open task list.
    Daily,
    /// One-line encouragement after a focus session.
    Motivation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightRequest {
    Prioritize { titles: Vec<String> },
    Motivate { completed: usize, focus_minutes: u32 },
}

impl InsightRequest {
    /// `None` when there is nothing to prioritise. Keeps at most five titles.
    pub fn prioritize(mut titles: Vec<String>) -> Option<Self> {
        titles.retain(|t| !t.trim().is_empty());
        if titles.is_empty() {
            return None;
        }
        titles.truncate(INSIGHT_TITLE_LIMIT);
        Some(Self::Prioritize { titles })
    }

    pub fn motivate(completed: usize, focus_minutes: u32) -> Self {
        Self::Motivate {
            completed,
            focus_minutes,
        }
    }

    pub fn kind(&self) -> InsightKind {
        match self {
            Self::Prioritize { .. } => InsightKind::Daily,
            Self::Motivate { .. } => InsightKind::Motivation,
        }
    }

    pub fn prompt(&self) -> String {
        match self {
            Self::Prioritize { titles } => format!(
                "Here are my tasks for today: {}. Give me one short, actionable piece of advice \
                 on how to prioritize or tackle this list efficiently. Max 20 words.",
                titles.join(", ")
            ),
            Self::Motivate {
                completed,
                focus_minutes,
            } => format!(
                "Give me a short, punchy, 1-sentence motivational quote for a developer/worker \
                 who has completed {completed} tasks and focused for {focus_minutes} minutes \
                 today. Make it sound like a friendly AI companion. Do not use quotes."
            ),
        }
    }
}

/// The fixed line substituted for a failed request.
pub fn fallback(kind: InsightKind, error: &InsightError) -> &'static str {
    match (kind, error) {
        (InsightKind::Daily, InsightError::MissingCredential) => {
            "Reviewing your tasks helps you stay organized."
        }
        (InsightKind::Daily, InsightError::EmptyResponse) => {
            "Tackle the hardest task first to gain momentum."
        }
        (InsightKind::Daily, _) => "Prioritize what matters most.",
        (InsightKind::Motivation, InsightError::MissingCredential) => {
            "Keep pushing forward! You're doing great."
        }
        (InsightKind::Motivation, InsightError::EmptyResponse) => {
            "Focus is the key to success. Keep going!"
        }
        (InsightKind::Motivation, _) => "Great job staying consistent today!",
    }
}

#[async_trait]
pub trait InsightClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError>;
}

/// Resolves `request` to display text, substituting the fallback on failure.
pub async fn resolve(client: &dyn InsightClient, request: &InsightRequest) -> String {
    match client.generate(&request.prompt()).await {
        Ok(text) => text,
        Err(e) => {
            let kind = request.kind();
            warn!(?kind, error = %e, "insight request failed, using fallback");
            fallback(kind, &e).to_string()
        }
    }
}

/// Gemini `generateContent` over HTTPS.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: InsightConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl GeminiClient {
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl InsightClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, InsightError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(InsightError::MissingCredential)?;

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(InsightError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }
        if raw.trim().is_empty() {
            return Err(InsightError::EmptyResponse);
        }

        let parsed: GenerateResponse = serde_json::from_str(&raw)?;
        parsed.text().ok_or(InsightError::EmptyResponse)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsightReply {
    pub kind: InsightKind,
    pub text: String,
}

/// Runs insight requests off the UI thread and hands replies back to the
/// owning view through a channel. Dropping the dispatcher closes the
/// channel, so late replies are discarded.
pub struct InsightDispatcher {
    runtime: Handle,
    client: Arc<dyn InsightClient>,
    tx: mpsc::UnboundedSender<InsightReply>,
    rx: mpsc::UnboundedReceiver<InsightReply>,
}

impl InsightDispatcher {
    pub fn new(runtime: Handle, client: Arc<dyn InsightClient>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            client,
            tx,
            rx,
        }
    }

    pub fn request(&self, request: InsightRequest) {
        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        debug!(kind = ?request.kind(), "dispatching insight request");
        self.runtime.spawn(async move {
            let text = resolve(client.as_ref(), &request).await;
            let reply = InsightReply {
                kind: request.kind(),
                text,
            };
            if tx.send(reply).is_err() {
                debug!("insight reply arrived after view closed, discarded");
            }
        });
    }

    /// Replies that have arrived since the last call, oldest first.
    pub fn drain(&mut self) -> Vec<InsightReply> {
        let mut replies = Vec::new();
        while let Ok(reply) = self.rx.try_recv() {
            replies.push(reply);
        }
        replies
    }

    pub async fn recv(&mut self) -> Option<InsightReply> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Canned(Result<&'static str, fn() -> InsightError>);

    #[async_trait]
    impl InsightClient for Canned {
        async fn generate(&self, _prompt: &str) -> Result<String, InsightError> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(make) => Err(make()),
            }
        }
    }

    #[test]
    fn prioritize_needs_titles_and_caps_at_five() {
        assert_eq!(InsightRequest::prioritize(vec![]), None);
        assert_eq!(InsightRequest::prioritize(vec!["  ".into()]), None);

        let titles: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        let Some(InsightRequest::Prioritize { titles }) = InsightRequest::prioritize(titles) else {
            panic!("expected a prioritize request");
        };
        assert_eq!(titles.len(), 5);
    }

    #[test]
    fn prompts_carry_request_data() {
        let p = InsightRequest::prioritize(vec!["a".into(), "b".into()]).unwrap();
        assert!(p.prompt().contains("a, b"));
        let m = InsightRequest::motivate(3, 75).prompt();
        assert!(m.contains("completed 3 tasks") && m.contains("75 minutes"));
    }

    #[test]
    fn response_text_is_extracted_and_trimmed() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":" Start small. "}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text().as_deref(), Some("Start small."));

        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(empty.text(), None);
    }

    #[tokio::test]
    async fn resolve_returns_text_or_fallback() {
        let ok = Canned(Ok("Do the big one first."));
        let req = InsightRequest::motivate(1, 25);
        assert_eq!(resolve(&ok, &req).await, "Do the big one first.");

        let missing = Canned(Err(|| InsightError::MissingCredential));
        assert_eq!(
            resolve(&missing, &req).await,
            "Keep pushing forward! You're doing great."
        );

        let empty = Canned(Err(|| InsightError::EmptyResponse));
        let daily = InsightRequest::prioritize(vec!["x".into()]).unwrap();
        assert_eq!(
            resolve(&empty, &daily).await,
            "Tackle the hardest task first to gain momentum."
        );
    }

    #[tokio::test]
    async fn missing_key_never_touches_the_network() {
        let client = GeminiClient::new(InsightConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..InsightConfig::default()
        })
        .unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, InsightError::MissingCredential));
    }

    #[tokio::test]
    async fn dispatcher_delivers_replies() {
        let client: Arc<dyn InsightClient> = Arc::new(Canned(Ok("Keep at it.")));
        let mut dispatcher = InsightDispatcher::new(Handle::current(), client);
        dispatcher.request(InsightRequest::motivate(0, 0));

        let reply = dispatcher.recv().await.unwrap();
        assert_eq!(reply.kind, InsightKind::Motivation);
        assert_eq!(reply.text, "Keep at it.");
    }
}
