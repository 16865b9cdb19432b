//! HTTP-backed collaborator clients.
//!
//! Both collaborators are thin JSON POST calls against a configured backend
//! endpoint. An elapsed timeout surfaces as an ordinary error so the runtime
//! can degrade to its fallback rule instead of blocking a turn. The reminder
//! parser gets one attempt per turn; the AI query client retries per the
//! configured budget.

use std::time::Duration;

use amica_core::config::{LlmConfig, ServicesConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::collaborators::{AiQueryClient, AiQueryResponse, ParsedReminder, ReminderParser};

#[derive(Debug, Serialize)]
struct UtterancePayload<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryPayload<'a> {
    text: &'a str,
    model: &'a str,
}

#[derive(Clone, Debug)]
pub struct HttpReminderParser {
    client: reqwest::Client,
    url: String,
}

/// AI query client carrying the llm section of the config: the configured
/// model rides along in the payload and the API key, when present, becomes a
/// bearer token.
#[derive(Clone, Debug)]
pub struct HttpAiQueryClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: u32,
}

impl HttpReminderParser {
    pub fn from_config(services: &ServicesConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(services.timeout_secs)?,
            url: services.reminder_parser_url.clone(),
        })
    }
}

impl HttpAiQueryClient {
    pub fn from_config(services: &ServicesConfig, llm: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(llm.timeout_secs)?,
            url: services.ai_query_url.clone(),
            model: llm.model.clone(),
            api_key: llm.api_key.clone(),
            max_retries: llm.max_retries,
        })
    }

    async fn send_query(&self, text: &str) -> Result<AiQueryResponse> {
        let mut request =
            self.client.post(&self.url).json(&QueryPayload { text, model: &self.model });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .context("ai query request failed")?
            .error_for_status()
            .context("ai query returned an error status")?;

        response.json().await.context("ai query returned malformed JSON")
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build http client")
}

#[async_trait]
impl ReminderParser for HttpReminderParser {
    async fn parse(&self, utterance: &str) -> Result<ParsedReminder> {
        let response = self
            .client
            .post(&self.url)
            .json(&UtterancePayload { text: utterance })
            .send()
            .await
            .context("reminder parser request failed")?
            .error_for_status()
            .context("reminder parser returned an error status")?;

        response.json().await.context("reminder parser returned malformed JSON")
    }
}

#[async_trait]
impl AiQueryClient for HttpAiQueryClient {
    async fn query(&self, text: &str) -> Result<AiQueryResponse> {
        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            match self.send_query(text).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    tracing::warn!(
                        event_name = "router.ai_query.attempt_failed",
                        attempt,
                        error = %error,
                        "ai query attempt failed"
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("ai query made no attempts")))
    }
}
