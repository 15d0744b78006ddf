//! Canned-response transport for unit tests.

use reqwest::StatusCode;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::api_handler::{ApiResponse, Transport};
use crate::config::AnnotatorConfig;
use crate::error::AnnotatorError;

pub(crate) const PROTEINS: &str = "http://proteins.test/proteins";
pub(crate) const ENSEMBL: &str = "http://ensembl.test";
pub(crate) const IDMAPPING: &str = "http://idmapping.test";

pub(crate) fn test_config() -> AnnotatorConfig {
    AnnotatorConfig::default()
        .with_protein_api_url(PROTEINS)
        .with_ensembl_api_url(ENSEMBL)
        .with_idmapping_api_url(IDMAPPING)
        .with_rate_limit_backoff(Duration::ZERO)
        .with_mapping_poll_interval(Duration::ZERO)
}

/// Serves queued responses per URL. The last queued response for a URL is
/// repeated; unknown URLs answer 404 without a body.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: RefCell<HashMap<String, VecDeque<ApiResponse>>>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_get(self, url: &str, status: u16, body: Option<Value>) -> Self {
        self.push(url.to_string(), status, body)
    }

    pub(crate) fn on_post(self, url: &str, status: u16, body: Option<Value>) -> Self {
        self.push(format!("POST {url}"), status, body)
    }

    fn push(self, key: String, status: u16, body: Option<Value>) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        self.routes
            .borrow_mut()
            .entry(key)
            .or_default()
            .push_back(ApiResponse::new(status, body));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == key).count()
    }

    fn respond(&self, key: String) -> ApiResponse {
        self.calls.borrow_mut().push(key.clone());
        let mut routes = self.routes.borrow_mut();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("non-empty queue"),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| ApiResponse::new(StatusCode::NOT_FOUND, None)),
            None => ApiResponse::new(StatusCode::NOT_FOUND, None),
        }
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, _headers: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError> {
        Ok(self.respond(url.to_string()))
    }

    fn post_form(&self, url: &str, _form: &[(&str, &str)]) -> Result<ApiResponse, AnnotatorError> {
        Ok(self.respond(format!("POST {url}")))
    }
}
