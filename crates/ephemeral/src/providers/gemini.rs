use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::base::{Provider, Usage};
use super::configs::GeminiProviderConfig;
use super::utils::{
    check_gemini_block, check_gemini_error, chunk_text, chunk_usage, parts_to_gemini_format,
};
use crate::models::content::ContentPart;

pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> Result<Self> {
        let mut builder = Client::builder();
        // A zero timeout would fail every request; treat it as unset
        if let Some(timeout) = config.timeout.filter(|t| !t.is_zero()) {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.host.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_payload(&self, parts: &[ContentPart]) -> Result<Value> {
        let mut payload = json!({
            "contents": [{
                "role": "user",
                "parts": parts_to_gemini_format(parts)?,
            }]
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(temp) = self.config.temperature {
            generation_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        Ok(payload)
    }

    async fn post(&self, payload: Value) -> Result<Response> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .context("Gemini request failed")?;

        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                let detail = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|value| check_gemini_error(&value))
                    .map(|e| e.to_string())
                    .unwrap_or(body);
                Err(anyhow!("Request failed: {}\n{}", status, detail))
            }
        }
    }

    /// Fold one streamed event into the reply
    fn absorb(data: &str, reply: &mut String, usage: &mut Usage) -> Result<()> {
        let chunk: Value = serde_json::from_str(data)
            .with_context(|| format!("Malformed stream chunk: {}", data))?;
        if let Some(err) = check_gemini_error(&chunk) {
            return Err(err);
        }
        let text = chunk_text(&chunk);
        // A late finish reason after streamed text keeps the partial reply
        if text.is_empty() && reply.is_empty() {
            if let Some(err) = check_gemini_block(&chunk) {
                warn!(chunk = %data, "reply withheld by the model");
                return Err(err);
            }
        }
        reply.push_str(&text);
        if let Some(chunk_usage) = chunk_usage(&chunk) {
            *usage = chunk_usage;
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, parts: &[ContentPart]) -> Result<(String, Usage)> {
        let payload = self.build_payload(parts)?;
        debug!(model = %self.config.model, parts = parts.len(), "sending request");

        let response = self.post(payload).await?;

        let mut reply = String::new();
        let mut usage = Usage::default();
        let mut chunks = 0usize;
        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| anyhow!("Gemini reply stream interrupted: {}", e))?;
            Self::absorb(&event.data, &mut reply, &mut usage)?;
            chunks += 1;
        }
        if chunks == 0 {
            return Err(anyhow!("Gemini returned an empty reply stream"));
        }

        debug!(
            chunks,
            input_tokens = ?usage.input_tokens,
            output_tokens = ?usage.output_tokens,
            "reply complete"
        );
        Ok((reply, usage))
    }
}
