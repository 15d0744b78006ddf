// src/api_handler.rs

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::AnnotatorError;

pub const JSON: &str = "application/json";

/// Status and decoded JSON body of one HTTP exchange.
///
/// `body` is `None` whenever the payload was missing or not JSON; callers
/// decide per status what that means.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }
}

/// The two request shapes the pipeline needs.
pub trait Transport {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError>;
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError>;
}

pub struct APIHandler {
    client: Client,
}

impl APIHandler {
    pub fn new(user_agent: &str) -> Result<Self, AnnotatorError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(AnnotatorError::Client)?;

        Ok(Self { client })
    }
}

impl Transport for APIHandler {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().map_err(|source| AnnotatorError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(into_api_response(response))
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError> {
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .map_err(|source| AnnotatorError::Http {
                url: url.to_string(),
                source,
            })?;
        Ok(into_api_response(response))
    }
}

fn into_api_response(response: Response) -> ApiResponse {
    let status = response.status();
    let body = response.json::<Value>().ok();
    ApiResponse { status, body }
}

/// GET with the single fixed backoff on HTTP 429.
///
/// The retry's response is returned as-is, whatever its status.
pub fn get_with_backoff(
    transport: &dyn Transport,
    url: &str,
    headers: &[(&str, &str)],
    backoff: Duration,
) -> Result<ApiResponse, AnnotatorError> {
    let response = transport.get(url, headers)?;
    if response.status != StatusCode::TOO_MANY_REQUESTS {
        return Ok(response);
    }

    warn!(
        "Reached limit of requests per second for {}. Waiting {:?} before retrying...",
        url, backoff
    );
    thread::sleep(backoff);
    transport.get(url, headers)
}
