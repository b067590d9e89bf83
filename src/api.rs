//! HTTP transport for the catalog backend.
//!
//! Four endpoints: book listing/search, book detail, book creation, and the
//! AI text proxy. Every call races the cancellation token against the round
//! trip, so a superseded request actually aborts its connection instead of
//! merely ignoring the result. Responses use the backend envelope
//! `{ status, message, data }`; error bodies are expected to carry a
//! human-readable `message`, and its absence falls back to a generic one.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::error::RequestError;
use crate::model::{BookDetail, BookSummary, CreatedBook, FilterCriteria};

/// Seam between the services and the wire. `ApiClient` is the production
/// implementation; tests inject fakes.
#[async_trait]
pub trait CatalogTransport: Send + Sync {
    async fn list_books(
        &self,
        criteria: &FilterCriteria,
        cancel: CancellationToken,
    ) -> Result<Vec<BookSummary>, RequestError>;

    async fn book_detail(
        &self,
        id: &str,
        cancel: CancellationToken,
    ) -> Result<BookDetail, RequestError>;

    async fn create_book(
        &self,
        payload: CreateBookPayload,
        cancel: CancellationToken,
    ) -> Result<CreatedBook, RequestError>;

    async fn generate_text(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, RequestError>;
}

/// Body of `POST /books`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookPayload {
    pub user_id: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
}

/// Backend envelope shared by all catalog endpoints.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    #[serde(default)]
    #[allow(dead_code)]
    status: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    model: &'a str,
    system: &'a str,
    temperature: f32,
}

/// Remote query parameters, built only from non-empty normalized fields.
/// The `ALL` sentinel collapses during normalization and so omits the
/// category parameter entirely.
fn search_params(criteria: &FilterCriteria) -> Vec<(&'static str, String)> {
    let criteria = criteria.normalized();
    let mut params = Vec::new();
    if !criteria.keyword.is_empty() {
        params.push(("keyword", criteria.keyword));
    }
    if !criteria.category.is_empty() {
        params.push(("category", criteria.category));
    }
    params
}

/// Production transport over reqwest.
pub struct ApiClient {
    http: Client,
    base_url: String,
    ai_model: String,
    ai_system_prompt: String,
    ai_temperature: f32,
}

impl ApiClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, RequestError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| {
                RequestError::transport("failed to build HTTP client", Some(err.to_string()))
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ai_model: config.ai_model.clone(),
            ai_system_prompt: config.ai_system_prompt.clone(),
            ai_temperature: config.ai_temperature,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Race the round trip against the token; the dropped future aborts the
    /// underlying connection.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, RequestError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(RequestError::Canceled),
            res = request.send() => res.map_err(|err| {
                RequestError::transport("request did not reach the backend", Some(err.to_string()))
            }),
        }
    }

    async fn read_body(
        &self,
        response: Response,
        cancel: &CancellationToken,
    ) -> Result<(reqwest::StatusCode, Vec<u8>), RequestError> {
        let status = response.status();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(RequestError::Canceled),
            res = response.bytes() => res.map_err(|err| {
                RequestError::transport("failed to read response body", Some(err.to_string()))
            })?,
        };
        Ok((status, body.to_vec()))
    }

    async fn envelope<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Envelope<T>, RequestError> {
        let response = self.send(request, cancel).await?;
        let (status, body) = self.read_body(response, cancel).await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| "backend request failed".to_string());
            debug!(status = status.as_u16(), "Backend returned failure status");
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
            });
        }
        serde_json::from_slice(&body)
            .map_err(|err| RequestError::malformed(format!("unexpected response shape: {err}")))
    }
}

#[async_trait]
impl CatalogTransport for ApiClient {
    async fn list_books(
        &self,
        criteria: &FilterCriteria,
        cancel: CancellationToken,
    ) -> Result<Vec<BookSummary>, RequestError> {
        let request = self
            .http
            .get(self.url("/books"))
            .query(&search_params(criteria));
        let envelope: Envelope<Vec<BookSummary>> = self.envelope(request, &cancel).await?;
        // Missing `data` on a success response means an empty catalog, not
        // a failure.
        Ok(envelope.data.unwrap_or_default())
    }

    async fn book_detail(
        &self,
        id: &str,
        cancel: CancellationToken,
    ) -> Result<BookDetail, RequestError> {
        let request = self.http.get(self.url(&format!("/books/{id}")));
        let envelope: Envelope<BookDetail> = self.envelope(request, &cancel).await?;
        envelope
            .data
            .ok_or_else(|| RequestError::malformed("detail response missing data"))
    }

    async fn create_book(
        &self,
        payload: CreateBookPayload,
        cancel: CancellationToken,
    ) -> Result<CreatedBook, RequestError> {
        let request = self.http.post(self.url("/books")).json(&payload);
        let envelope: Envelope<CreatedBook> = self.envelope(request, &cancel).await?;
        envelope
            .data
            .ok_or_else(|| RequestError::malformed("create response missing data"))
    }

    async fn generate_text(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, RequestError> {
        let body = ChatRequest {
            prompt,
            model: &self.ai_model,
            system: &self.ai_system_prompt,
            temperature: self.ai_temperature,
        };
        let request = self.http.post(self.url("/api/openai")).json(&body);
        let response = self.send(request, &cancel).await?;
        let (status, body) = self.read_body(response, &cancel).await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| "text generation failed".to_string());
            return Err(RequestError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let completion: ChatCompletion = serde_json::from_slice(&body)
            .map_err(|err| RequestError::malformed(format!("unexpected completion shape: {err}")))?;
        Ok(extract_content(completion))
    }
}

/// `choices[0].message.content`, defaulting to the empty string when any
/// layer is absent.
fn extract_content(completion: ChatCompletion) -> String {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_skip_empty_keyword_and_all_category() {
        assert!(search_params(&FilterCriteria::new("", "ALL")).is_empty());
        assert!(search_params(&FilterCriteria::new("   ", "")).is_empty());
    }

    #[test]
    fn params_carry_normalized_values() {
        let params = search_params(&FilterCriteria::new(" Kim ", " UX/UI "));
        assert_eq!(
            params,
            vec![
                ("keyword", "kim".to_string()),
                ("category", "ux/ui".to_string()),
            ]
        );
    }

    #[test]
    fn envelope_missing_data_decodes_to_none() {
        let envelope: Envelope<Vec<BookSummary>> =
            serde_json::from_str(r#"{"status":200,"message":"ok"}"#).unwrap();
        assert!(envelope.data.is_none());
    }

    #[test]
    fn envelope_decodes_book_list() {
        let envelope: Envelope<Vec<BookSummary>> = serde_json::from_str(
            r#"{
                "status": 200,
                "message": "ok",
                "data": [
                    {"bookId": "b-1", "title": "AI Product Design", "author": "Alice Kim", "category": "UX/UI"}
                ]
            }"#,
        )
        .unwrap();
        let books = envelope.data.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "b-1");
        assert_eq!(books[0].cover_url, None);
    }

    #[test]
    fn completion_content_defaults_to_empty() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(extract_content(completion), "");

        let completion: ChatCompletion =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert_eq!(extract_content(completion), "");
    }

    #[test]
    fn completion_content_is_extracted_from_first_choice() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"A concise blurb."}},{"message":{"content":"ignored"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_content(completion), "A concise blurb.");
    }

    #[test]
    fn create_payload_uses_wire_field_names() {
        let payload = CreateBookPayload {
            user_id: "u-1".to_string(),
            title: "T".to_string(),
            author: "A".to_string(),
            category: String::new(),
            description: String::new(),
            ai_summary: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert!(json.get("aiSummary").is_none());

        let with_summary = CreateBookPayload {
            ai_summary: Some("blurb".to_string()),
            ..payload
        };
        let json = serde_json::to_value(&with_summary).unwrap();
        assert_eq!(json["aiSummary"], "blurb");
    }
}
