use crate::config::Settings;
use crate::narrative::{NarrativeClient, RationaleInput};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_MAX_TOKENS: u32 = 256;
const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    fn system_prompt() -> &'static str {
        "You are a stock-scan assistant. Write ONE short plain-text paragraph \
         (2-3 sentences) explaining why the given ticker was flagged, grounded \
         strictly in the provided factor values. No markdown, no disclaimers, \
         no price predictions beyond the given levels."
    }

    fn user_prompt(input: &RationaleInput) -> String {
        let factors = input
            .factors
            .iter()
            .map(|(name, pts)| format!("{name}={pts:+.1}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Ticker: {}\nCategory: {}\nComposite score: {:.1}/100\nPrice: {:.2}\nFactors: {}",
            input.ticker,
            input.category.label(),
            input.score,
            input.price,
            factors
        )
    }

    async fn create_message(&self, req: CreateMessageRequest) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        if !status.is_success() {
            anyhow::bail!("Anthropic HTTP {status}: {text}");
        }

        serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }
}

#[async_trait::async_trait]
impl NarrativeClient for AnthropicClient {
    async fn generate_rationale(&self, input: &RationaleInput) -> anyhow::Result<String> {
        let req = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(Self::system_prompt().to_string()),
            messages: vec![Message {
                role: "user",
                content: Self::user_prompt(input),
            }],
        };

        let res = self.create_message(req).await?;
        let text = Self::response_text(&res).trim().to_string();
        anyhow::ensure!(!text.is_empty(), "Anthropic returned no text content");
        Ok(text)
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use serde_json::json;

    #[test]
    fn extracts_text_blocks_and_ignores_unknown() {
        let v = json!({
            "content": [
                {"type": "text", "text": "Flagged on a volume surge."},
                {"type": "tool_use", "id": "x", "name": "n", "input": {}}
            ]
        });
        let res: CreateMessageResponse = serde_json::from_value(v).unwrap();
        assert_eq!(
            AnthropicClient::response_text(&res),
            "Flagged on a volume surge."
        );
    }

    #[test]
    fn user_prompt_lists_factors_with_signs() {
        let input = RationaleInput {
            ticker: "ACME".to_string(),
            category: Category::Swing,
            score: 55.0,
            price: 31.2,
            factors: vec![
                ("rsi_zone".to_string(), 25.0),
                ("options_positioning".to_string(), -5.0),
            ],
        };
        let prompt = AnthropicClient::user_prompt(&input);
        assert!(prompt.contains("rsi_zone=+25.0"));
        assert!(prompt.contains("options_positioning=-5.0"));
        assert!(prompt.contains("Category: swing"));
    }
}
