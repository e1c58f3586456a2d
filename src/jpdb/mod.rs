//! jpdb.io API client
//!
//! Thin async wrapper over the endpoints this tool needs: key validation, text
//! parsing, deck creation, adding vocabulary and setting custom card sentences.
//! A 429 response is retried once after a fixed backoff.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::deck::DeckService;
use crate::tokenizer::{RawToken, Tokenizer, VocabularyKey};

pub mod wire;

use wire::{
    AddVocabularyRequest, CreateDeckRequest, CreateDeckResponse, ParseRequest, ParseResponse,
    SetCardSentenceRequest,
};

pub const JPDB_API_BASE: &str = "https://jpdb.io";

/// Errors from talking to jpdb.io
#[derive(Debug, Error)]
pub enum JpdbError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },
}

/// Configuration for [`JpdbClient`]
#[derive(Debug, Clone)]
pub struct JpdbConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
    /// Wait before the single retry of a rate-limited request
    pub rate_limit_backoff: Duration,
}

impl JpdbConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: JPDB_API_BASE.to_string(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(60),
            rate_limit_backoff: Duration::from_secs(5),
        }
    }
}

pub struct JpdbClient {
    http: Client,
    config: JpdbConfig,
}

impl JpdbClient {
    pub fn new(config: JpdbConfig) -> Result<Self, JpdbError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Check that the API key is accepted
    pub async fn ping(&self) -> Result<(), JpdbError> {
        self.request::<_, serde::de::IgnoredAny>("/api/v1/ping", &serde_json::json!({}))
            .await
            .map(|_| ())
    }

    /// Tokenize `text`; offsets in the result are code-point offsets into `text`
    pub async fn parse(&self, text: &str) -> Result<Vec<RawToken>, JpdbError> {
        let response: ParseResponse = self.request(wire::PARSE_ENDPOINT, &ParseRequest::new(text)).await?;
        response.into_raw_tokens()
    }

    pub async fn create_empty_deck(&self, name: &str) -> Result<u64, JpdbError> {
        let response: CreateDeckResponse = self
            .request("/api/v1/deck/create-empty", &CreateDeckRequest { name })
            .await?;
        Ok(response.id)
    }

    pub async fn add_vocabulary_to_deck(&self, deck_id: u64, keys: &[VocabularyKey]) -> Result<(), JpdbError> {
        if keys.is_empty() {
            return Ok(());
        }
        self.request::<_, serde::de::IgnoredAny>("/api/v1/deck/add-vocabulary", &AddVocabularyRequest::new(deck_id, keys))
            .await
            .map(|_| ())
    }

    pub async fn set_card_sentence_with_translation(
        &self,
        key: VocabularyKey,
        sentence: &str,
        translation: Option<&str>,
    ) -> Result<(), JpdbError> {
        let body = SetCardSentenceRequest { vid: key.vid, sid: key.sid, sentence, translation };
        self.request::<_, serde::de::IgnoredAny>("/api/v1/set-card-sentence", &body)
            .await
            .map(|_| ())
    }

    async fn request<B, R>(&self, endpoint: &str, body: &B) -> Result<R, JpdbError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.config.base_url, endpoint);
        debug!("POST {}", url);

        let mut response = self.send(&url, body).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                "Rate limited on {}, retrying in {:.1}s",
                endpoint,
                self.config.rate_limit_backoff.as_secs_f64()
            );
            tokio::time::sleep(self.config.rate_limit_backoff).await;
            response = self.send(&url, body).await?;
        }

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(JpdbError::Api {
                status: status.as_u16(),
                message: wire::error_message(&text),
            });
        }

        // Some endpoints answer with an empty body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| JpdbError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    async fn send<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<reqwest::Response, JpdbError> {
        Ok(self
            .http
            .post(url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?)
    }
}

impl Tokenizer for JpdbClient {
    type Error = JpdbError;

    async fn parse_chunk(&self, text: &str) -> Result<Vec<RawToken>, JpdbError> {
        self.parse(text).await
    }
}

impl DeckService for JpdbClient {
    type Error = JpdbError;

    async fn create_deck(&self, name: &str) -> Result<u64, JpdbError> {
        self.create_empty_deck(name).await
    }

    async fn add_vocabulary(&self, deck_id: u64, keys: &[VocabularyKey]) -> Result<(), JpdbError> {
        self.add_vocabulary_to_deck(deck_id, keys).await
    }

    async fn set_card_sentence(&self, key: VocabularyKey, sentence: &str) -> Result<(), JpdbError> {
        self.set_card_sentence_with_translation(key, sentence, None).await
    }
}
