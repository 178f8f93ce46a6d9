//! Field-extraction provider abstraction and implementations.
//!
//! Defines the [`FieldExtractor`] trait and concrete implementations:
//! - **[`DisabledExtractor`]** — returns errors; used when extraction is not configured.
//! - **[`OpenAIExtractor`]** — sends each chunk to the OpenAI chat completions API
//!   with a fixed prompt that pins the seven-field block format.
//! - **[`RulesExtractor`]** — offline keyword heuristics; no network calls.
//!
//! # Provider Selection
//!
//! Use [`create_extractor`] to instantiate the appropriate provider based
//! on the configuration:
//!
//! ```rust,no_run
//! # use stockroom::config::ExtractionConfig;
//! # use stockroom::extract::create_extractor;
//! let config = ExtractionConfig::default(); // provider = "disabled"
//! let extractor = create_extractor(&config).unwrap();
//! assert_eq!(extractor.name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! The OpenAI extractor retries transient errors with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//!
//! The schedule is owned by [`RetryPolicy`], so tests can swap in a
//! zero-delay policy instead of sleeping for real.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::blockfile::parse_candidates;
use crate::config::ExtractionConfig;
use crate::heuristics::RulesExtractor;
use crate::models::ItemRecord;
use crate::retry::RetryPolicy;

/// Turns one chunk of raw OCR text into structured inventory records.
///
/// Implementations own their transport and parsing. Extracted records carry
/// no `Location` value; slot assignment happens later in the pipeline. A
/// failed chunk is skippable from the caller's point of view, so an
/// implementation should return an error rather than invent records.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Returns the provider identifier (e.g. `"openai"`, `"rules"`).
    fn name(&self) -> &str;

    /// Extract structured records from one chunk of raw text.
    async fn extract(&self, chunk: &str) -> Result<Vec<ItemRecord>>;
}

// ============ Disabled Extractor ============

/// A no-op extractor that always returns errors.
///
/// Used when `extraction.provider = "disabled"` in the configuration.
pub struct DisabledExtractor;

#[async_trait]
impl FieldExtractor for DisabledExtractor {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn extract(&self, _chunk: &str) -> Result<Vec<ItemRecord>> {
        bail!(
            "Extraction provider is disabled. Set extraction.provider = \"openai\" \
             (requires OPENAI_API_KEY) or \"rules\" in the config file."
        )
    }
}

// ============ OpenAI Extractor ============

/// System message sent with every extraction request.
const SYSTEM_MESSAGE: &str = "You are a helpful assistant that extracts structured data.";

/// Extractor backed by the OpenAI chat completions API.
///
/// Calls `POST /v1/chat/completions` with the configured model and parses
/// the reply with the same block parser used for the store file. Requires
/// the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAIExtractor {
    /// Model name (e.g. `"gpt-4-turbo"`).
    model: String,
    api_key: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl OpenAIExtractor {
    /// Create a new OpenAI extractor from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            policy: RetryPolicy::new(
                config.max_retries,
                Duration::from_secs(config.base_delay_secs),
            ),
        })
    }

    /// Call the chat completions API with retry/backoff and return the
    /// assistant message text.
    async fn request_chat(&self, prompt: &str) -> Result<String> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_MESSAGE},
                {"role": "user", "content": prompt},
            ],
        });

        let mut last_err = None;

        for attempt in 0..=self.policy.max_retries {
            self.policy.wait(attempt).await;

            let resp = client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("OpenAI API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429): don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("OpenAI API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Extraction failed after retries")))
    }
}

#[async_trait]
impl FieldExtractor for OpenAIExtractor {
    fn name(&self) -> &str {
        "openai"
    }

    async fn extract(&self, chunk: &str) -> Result<Vec<ItemRecord>> {
        let prompt = build_prompt(chunk);
        let reply = self.request_chat(&prompt).await?;
        Ok(parse_candidates(&reply))
    }
}

/// Build the extraction prompt for one chunk.
///
/// The format instructions must stay in lockstep with the field labels in
/// [`crate::models`]: the reply is parsed by [`parse_candidates`], which
/// only recognizes those labels.
fn build_prompt(chunk: &str) -> String {
    format!(
        "Extract the following fields from the text:\n\
         Image (as the first line in the format \"Image: <filename>\"), \
         Part number, Manufacturer Part number, Fabricated Company, Description, \
         Footprint, and Component Type.\n\
         Format the output exactly as follows (do not include a Location):\n\
         \n\
         Image: <filename>\n\
         Part number: <value>\n\
         Manufacturer Part number: <value>\n\
         Fabricated Company: <value>\n\
         Description: <value>\n\
         Footprint: <value>\n\
         Component Type: <value>\n\
         \n\
         Process each entry found in the text using the above structure. \
         Do not include any additional formatting or text.\n\
         \n\
         Text:\n{chunk}\n"
    )
}

/// Pull the assistant message text out of a chat completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid OpenAI response: missing message content"))?;

    Ok(content.trim().to_string())
}

/// Create the appropriate [`FieldExtractor`] based on configuration.
///
/// # Supported Providers
///
/// | Config Value | Extractor |
/// |-------------|-----------|
/// | `"disabled"` | [`DisabledExtractor`] |
/// | `"openai"` | [`OpenAIExtractor`] |
/// | `"rules"` | [`RulesExtractor`] |
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider cannot
/// be initialized (missing API key).
pub fn create_extractor(config: &ExtractionConfig) -> Result<Box<dyn FieldExtractor>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledExtractor)),
        "openai" => Ok(Box::new(OpenAIExtractor::new(config)?)),
        "rules" => Ok(Box::new(RulesExtractor)),
        other => bail!("Unknown extraction provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_pins_output_format() {
        let prompt = build_prompt("R-1001 325 OHM");
        assert!(prompt.starts_with("Extract the following fields"));
        assert!(prompt.contains("do not include a Location"));
        assert!(prompt.contains("Component Type: <value>"));
        assert!(prompt.ends_with("Text:\nR-1001 325 OHM\n"));
    }

    #[test]
    fn test_parse_chat_response_trims_content() {
        let json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "  Image: a.jpg\nPart number: X\n"}}
            ]
        });
        let content = parse_chat_response(&json).unwrap();
        assert_eq!(content, "Image: a.jpg\nPart number: X");
    }

    #[test]
    fn test_parse_chat_response_missing_content() {
        let json = serde_json::json!({"choices": []});
        assert!(parse_chat_response(&json).is_err());
    }

    #[tokio::test]
    async fn test_disabled_extractor_errors() {
        let err = DisabledExtractor.extract("anything").await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_create_extractor_unknown_provider() {
        let config = ExtractionConfig {
            provider: "palm".to_string(),
            ..ExtractionConfig::default()
        };
        assert!(create_extractor(&config).is_err());
    }

    #[test]
    fn test_create_extractor_disabled_by_default() {
        let config = ExtractionConfig::default();
        let extractor = create_extractor(&config).unwrap();
        assert_eq!(extractor.name(), "disabled");
    }
}
