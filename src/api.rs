//! Chat-completion API interaction for article analysis.
//!
//! This module talks to an OpenAI-compatible chat-completion endpoint (the
//! default is DeepSeek) and turns each article into a one-sentence summary
//! and a short topic list.
//!
//! # Reply contract
//!
//! The prompt asks the model for exactly two labelled lines:
//!
//! ```text
//! SUMMARY: <one sentence>
//! TOPICS: topic1, topic2, topic3
//! ```
//!
//! Nothing enforces that format, so [`parse_response`] is total: it accepts
//! any text and falls back to defaults for whatever it cannot find. The rest
//! of the pipeline only ever sees the typed [`AnalysisResult`].
//!
//! # Architecture
//!
//! - [`Analyze`]: core trait, one article text in, raw reply (or nothing) out
//! - [`AnalysisClient`]: HTTP implementation with a fixed per-call timeout
//!
//! Calls are attempted once. Transport errors, non-2xx statuses, timeouts and
//! malformed bodies are logged and reported as `None`.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::models::{AnalysisResult, AnalysisStatus, NO_SUMMARY};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const SYSTEM_PROMPT: &str = "You are an AI assistant designed to help extract key insights \
from a text. You must follow the exact output format specified by the user.";

static SUMMARY_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"SUMMARY:\s*(.+)").expect("static regex"));
static TOPICS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TOPICS:\s*(.+)").expect("static regex"));

/// Trait for async article analysis.
///
/// Implementors send article text to a model and return its raw reply.
/// `None` means the call failed; implementations report the cause
/// themselves and never surface an error to the caller.
pub trait Analyze {
    async fn analyze(&self, text: &str) -> Option<String>;
}

/// One chat message of the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Build the message list for one article.
pub fn build_prompt(article_text: &str) -> Vec<ChatMessage> {
    let user_prompt = format!(
        "Please analyze the following article text and provide:\n\
         1. A clear and concise one-sentence summary that captures the main point\n\
         2. 3 to 5 topics or keywords that best represent the central themes\n\
         \n\
         IMPORTANT: Return your response in exactly this format:\n\
         SUMMARY: [your one-sentence summary here]\n\
         TOPICS: topic1, topic2, topic3, topic4, topic5\n\
         \n\
         Article text:\n\
         {article_text}"
    );
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: user_prompt,
        },
    ]
}

/// Turn a raw reply into an [`AnalysisResult`]. Never fails.
///
/// `SUMMARY:` and `TOPICS:` are searched independently, in any order, and
/// may be surrounded by other text. Whitespace after a label may span a
/// line break, so a label with nothing after it captures the next line.
///
/// # Arguments
///
/// * `reply` - The model's raw reply, or `None` if the call failed
///
/// # Returns
///
/// The parsed summary and topics. Topics are split on commas, trimmed, and
/// empty fragments dropped. A missing reply or empty text gives
/// [`AnalysisResult::unavailable`].
pub fn parse_response(reply: Option<&str>) -> AnalysisResult {
    let Some(text) = reply.filter(|t| !t.trim().is_empty()) else {
        return AnalysisResult::unavailable();
    };

    let summary = SUMMARY_LINE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_SUMMARY.to_string());

    let topics = TOPICS_LINE
        .captures(text)
        .map(|c| {
            c[1].split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    AnalysisResult {
        summary,
        topics,
        status: AnalysisStatus::Analyzed,
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: String,
}

/// HTTP analysis client for an OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl AnalysisClient {
    /// Build a client from configuration. Requires an API key.
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| ConfigError::InvalidApiKey)?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            timeout: config.timeout(),
        })
    }

    async fn request(&self, text: &str) -> Result<String, AnalysisError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: build_prompt(text),
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AnalysisError::Status {
                status,
                body: truncate_for_log(&body, 300),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(AnalysisError::EmptyReply)
    }
}

impl Analyze for AnalysisClient {
    #[instrument(level = "info", skip_all, fields(bytes = text.len()))]
    async fn analyze(&self, text: &str) -> Option<String> {
        let t0 = Instant::now();
        let res = self.request(text).await;
        let dt = t0.elapsed();

        match res {
            Ok(reply) => {
                debug!(
                    elapsed_ms = dt.as_millis() as u64,
                    reply_preview = %truncate_for_log(&reply, 200),
                    "Analysis call succeeded"
                );
                Some(reply)
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "Analysis call failed");
                None
            }
        }
    }
}
