//! Chapter summarization through an OpenAI-compatible chat completions API.
//!
//! ```no_run
//! use epitome::summary::{ChatSummarizer, Summarizer, SummaryConfig};
//!
//! let summarizer = ChatSummarizer::new(SummaryConfig::from_env())?;
//! let summary = summarizer.summarize("It was a bright cold day in April...")?;
//! println!("{summary}");
//! # Ok::<(), epitome::Error>(())
//! ```

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes book chapters.";
const USER_PROMPT: &str = "Please provide a brief summary of the following chapter content:";

/// Anything that can turn chapter text into a summary.
pub trait Summarizer {
    fn summarize(&self, content: &str) -> Result<String>;
}

/// Connection and prompt settings for [`ChatSummarizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryConfig {
    pub api_key: Option<String>,
    /// Base URL up to and including the API version, without a trailing slash.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Input beyond this many characters is cut off before sending.
    pub max_input_chars: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 500,
            max_input_chars: 4000,
        }
    }
}

impl SummaryConfig {
    /// Defaults overridden by `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `EPITOME_MODEL`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("EPITOME_MODEL") {
            config.model = model;
        }
        config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Blocking client for a chat completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatSummarizer {
    client: Client,
    config: SummaryConfig,
}

impl ChatSummarizer {
    pub fn new(config: SummaryConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { client, config })
    }

    fn request<'a>(&'a self, content: &str) -> ChatRequest<'a> {
        let excerpt = truncate_chars(content, self.config.max_input_chars);
        ChatRequest {
            model: &self.config.model,
            messages: [
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user",
                    content: format!("{USER_PROMPT} {excerpt}"),
                },
            ],
            max_tokens: self.config.max_tokens,
        }
    }
}

impl Summarizer for ChatSummarizer {
    fn summarize(&self, content: &str) -> Result<String> {
        if content.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        let request = self.request(content);
        debug!(
            model = %self.config.model,
            chars = content.chars().count().min(self.config.max_input_chars),
            "Requesting summary"
        );

        let mut builder = self.client.post(self.config.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(Error::Summary(format!("{status}: {}", detail.trim())));
        }

        let response: ChatResponse = response.json()?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::Summary("response contained no summary".to_string()))
    }
}

/// The first `max` characters of `text`, cut on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("\u{e9}t\u{e9}", 2), "\u{e9}t");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_request_body() {
        let summarizer = ChatSummarizer::new(SummaryConfig {
            max_input_chars: 5,
            ..SummaryConfig::default()
        })
        .unwrap();

        let body = serde_json::to_value(summarizer.request("abcdefgh")).unwrap();
        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(
            body["messages"][1]["content"],
            "Please provide a brief summary of the following chapter content: abcde"
        );
    }

    #[test]
    fn test_blank_content_rejected_before_request() {
        // Unroutable endpoint: reaching the network would surface as Error::Summary.
        let summarizer = ChatSummarizer::new(SummaryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..SummaryConfig::default()
        })
        .unwrap();

        assert!(matches!(summarizer.summarize(""), Err(Error::EmptyContent)));
        assert!(matches!(summarizer.summarize(" \n\t"), Err(Error::EmptyContent)));
    }

    #[test]
    fn test_connection_failure_is_summary_error() {
        let summarizer = ChatSummarizer::new(SummaryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..SummaryConfig::default()
        })
        .unwrap();

        let err = summarizer.summarize("Some chapter text").unwrap_err();
        assert!(matches!(err, Error::Summary(ref msg) if !msg.is_empty()));
        assert!(err.to_string().starts_with("Error generating summary: "));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = SummaryConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..SummaryConfig::default()
        };
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
