//! Classification capability and its HTTP adapter.

use crate::config::Settings;
use crate::error::ClassificationError;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Sends one prompt and returns the service's raw text answer
pub trait Classifier: Send + Sync {
    fn classify(&self, model: &str, prompt: &str) -> Result<String, ClassificationError>;
}

/// Classifier backed by an HTTP `POST` with a bearer credential
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

const ERROR_BODY_CHARS: usize = 200;

impl HttpClassifier {
    /// `endpoint` may contain `{model}`, replaced per request
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.to_string(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_key, &settings.endpoint, settings.timeout())
    }

    fn url_for(&self, model: &str) -> String {
        self.endpoint.replace("{model}", model)
    }
}

impl Classifier for HttpClassifier {
    fn classify(&self, model: &str, prompt: &str) -> Result<String, ClassificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        let body = json!({
            "model": model,
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let url = self.url_for(model);
        debug!(%url, prompt_chars = prompt.len(), "sending classification request");

        let response = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let text = response.text().map_err(|e| self.transport_error(e))?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ClassificationError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body: text.chars().take(ERROR_BODY_CHARS).collect(),
            });
        }

        extract_response_text(&text).ok_or(ClassificationError::EmptyResponse)
    }
}

impl HttpClassifier {
    fn transport_error(&self, error: reqwest::Error) -> ClassificationError {
        if error.is_timeout() {
            ClassificationError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            ClassificationError::Transport(error.to_string())
        }
    }
}

/// Unwrap the model's text from a response body.
///
/// Tries `candidates[].content.parts[].text`, then a top-level `text` field,
/// then uses the body as-is.
pub fn extract_response_text(body: &str) -> Option<String> {
    let text = match serde_json::from_str::<Value>(body) {
        Ok(value) => candidate_text(&value)
            .or_else(|| value.get("text").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    };

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn candidate_text(value: &Value) -> Option<String> {
    value
        .get("candidates")?
        .as_array()?
        .iter()
        .filter_map(|candidate| candidate.pointer("/content/parts")?.as_array())
        .flatten()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}
