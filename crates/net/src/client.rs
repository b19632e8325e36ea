//! HTTP client for the message API

use std::time::Duration;

use async_trait::async_trait;
use parley_core::{ClientConfig, Message, MessageQuery, NewMessage};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, Url};
use tracing::{debug, warn};

use crate::error::{ApiError, Error, Result, GENERIC_API_ERROR_MESSAGE};
use crate::transport::MessageTransport;

/// API prefix appended to the configured origin
const API_PREFIX: &str = "/api/v1";

/// REST client for `{api_url}/api/v1/messages`
///
/// Every request carries the bearer token and a JSON content type.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    messages_url: Url,
}

impl HttpClient {
    /// Build a client for the given origin and token
    pub fn new(api_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base = api_url.trim_end_matches('/');
        let messages_url = Url::parse(&format!("{}{}/messages", base, API_PREFIX))
            .map_err(|e| Error::InvalidBaseUrl(format!("{}: {}", api_url, e)))?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::InvalidBaseUrl("token contains invalid header characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, messages_url })
    }

    /// Build a client from the client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(&config.api_url, &config.api_token, config.request_timeout())
    }

    /// Full URL of the messages collection
    pub fn messages_url(&self) -> &Url {
        &self.messages_url
    }

    /// Fetch messages matching the query
    pub async fn get_messages(&self, query: &MessageQuery) -> Result<Vec<Message>> {
        let pairs = query.to_pairs();
        debug!(url = %self.messages_url, query = ?pairs, "GET messages");

        let mut request = self.http.get(self.messages_url.clone());
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        let response = request.send().await.map_err(log_failure)?;
        decode_messages(&read_body(response).await?)
    }

    /// Create a message and return the stored record
    pub async fn post_message(&self, payload: &NewMessage) -> Result<Message> {
        debug!(url = %self.messages_url, author = %payload.author, "POST message");

        let response = self
            .http
            .post(self.messages_url.clone())
            .json(payload)
            .send()
            .await
            .map_err(log_failure)?;
        let body = read_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[async_trait]
impl MessageTransport for HttpClient {
    async fn list_messages(&self, query: &MessageQuery) -> Result<Vec<Message>> {
        self.get_messages(query).await
    }

    async fn create_message(&self, payload: &NewMessage) -> Result<Message> {
        self.post_message(payload).await
    }
}

fn log_failure(e: reqwest::Error) -> Error {
    warn!(error = %e, "API request failed");
    Error::Http(e)
}

/// Body of a 2xx response, or [`Error::Api`] for anything else
async fn read_body(response: Response) -> Result<Vec<u8>> {
    let status = response.status();

    if !status.is_success() {
        let body = response.bytes().await.unwrap_or_default();
        let api = parse_error_body(&body, status.as_u16());
        warn!(status = status.as_u16(), message = %api.message, "API request failed");
        return Err(Error::Api(api));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Decode a page of messages
///
/// The page itself must be a JSON array. A record that does not parse (bad
/// `createdAt`, missing field) is logged and skipped so one bad row cannot
/// block the rest of the log.
fn decode_messages(body: &[u8]) -> Result<Vec<Message>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))?;

    let messages: Vec<Message> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Message>(record) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(error = %e, "Skipping malformed message");
                None
            }
        })
        .collect();
    Ok(messages)
}

/// Best-effort parse of `{message, statusCode}`; unparseable bodies get a
/// generic message and the actual status
fn parse_error_body(body: &[u8], status: u16) -> ApiError {
    match serde_json::from_slice::<ApiError>(body) {
        Ok(api) => ApiError {
            status_code: api.status_code.or(Some(status)),
            message: api.message,
        },
        Err(_) => ApiError {
            message: GENERIC_API_ERROR_MESSAGE.to_string(),
            status_code: Some(status),
        },
    }
}
