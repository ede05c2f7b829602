use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{AnalysisFailure, AnalysisResult};
use crate::metrics::{MISSING_CREDENTIALS, PROVIDER_LATENCY, PROVIDER_OUTCOMES};
use crate::models::{Content, GenerateContentRequest, GenerationConfig, Part};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// Where the answer text may live, tried in order
const EXTRACTION_PATHS: [&str; 3] = [
    "/candidates/0/content/parts/0/text",
    "/candidates/0/content/text",
    "/text",
];

pub fn build_prompt(text: &str) -> String {
    format!(
        "Analyze this text and provide a clear, helpful explanation. \
         If it's a single word, provide a definition. \
         If it's a technical paragraph, simplify it. \
         If it's an error message, explain what it means and how to fix it. \
         Keep the response concise and user-friendly.\n\n\
         Text to analyze: \"{}\"",
        text
    )
}

// First non-empty answer text found in a success body.
pub fn extract_analysis(body: &Value) -> Option<String> {
    EXTRACTION_PATHS
        .iter()
        .filter_map(|path| body.pointer(path).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    model: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            model: model.into(),
            generation: GenerationConfig::default(),
        }
    }

    fn endpoint(&self, api_key: &str) -> Result<Url, AnalysisFailure> {
        let raw = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);
        Url::parse_with_params(&raw, &[("key", api_key)]).map_err(AnalysisFailure::request_failed)
    }

    // Make exactly one provider call. A missing key fails before any I/O
    pub async fn analyze(&self, text: &str, api_key: Option<&str>) -> AnalysisResult {
        let api_key = match api_key.map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                MISSING_CREDENTIALS.inc();
                return Err(AnalysisFailure::missing_credential());
            }
        };

        let result = self.call(text, api_key).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(failure) => failure.kind.as_str(),
        };
        PROVIDER_OUTCOMES.with_label_values(&[outcome]).inc();
        result
    }

    async fn call(&self, text: &str, api_key: &str) -> AnalysisResult {
        let url = self.endpoint(api_key)?;
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(text),
                }],
            }],
            generation_config: self.generation,
        };

        debug!(model = %self.model, chars = text.len(), "calling Gemini");
        let start = Instant::now();
        let sent = self.client.post(url).json(&body).send().await;
        PROVIDER_LATENCY.observe(start.elapsed().as_secs_f64());

        let res = sent.map_err(classify_transport)?;
        let status = res.status();
        let bytes = res.bytes().await.map_err(classify_transport)?;

        if !status.is_success() {
            return Err(classify_error_body(status, &bytes));
        }

        let json: Value = match serde_json::from_slice(&bytes) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Gemini success body was not JSON");
                return Err(AnalysisFailure::empty_response());
            }
        };
        extract_analysis(&json).ok_or_else(|| {
            warn!("no analysis text in Gemini response");
            AnalysisFailure::empty_response()
        })
    }
}

fn classify_transport(err: reqwest::Error) -> AnalysisFailure {
    warn!(error = %err, "Gemini request failed");
    if err.is_connect() || err.is_timeout() {
        AnalysisFailure::network()
    } else {
        AnalysisFailure::request_failed(err)
    }
}

// Any JSON body with a truthy `error` is a provider error, whatever its shape
fn classify_error_body(status: StatusCode, bytes: &[u8]) -> AnalysisFailure {
    let error = serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|body| body.get("error").cloned())
        .filter(is_truthy);

    match error {
        Some(error) => {
            let code = error.get("code").and_then(integer_code);
            let message = error.get("message").and_then(Value::as_str);
            warn!(status = status.as_u16(), code = ?code, "Gemini returned an error");
            AnalysisFailure::from_provider_code(code, message)
        }
        None => {
            warn!(status = status.as_u16(), "Gemini error body was not understood");
            AnalysisFailure::http(status.as_u16(), status.canonical_reason().unwrap_or(""))
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// 429 and 429.0 are the same code; "429" is not
fn integer_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}
