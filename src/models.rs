use serde::{Deserialize, Serialize};
use std::time::Duration;

// Context menu entry id that triggers an explanation.
pub const EXPLAIN_MENU_ITEM: &str = "explainWithAI";

// Response popups close themselves after this long.
pub const RESPONSE_AUTO_DISMISS: Duration = Duration::from_secs(10);

pub const LOADING_MESSAGE: &str = "Analyzing text with AI...";

// Persisted request counter for the current window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateWindow {
    pub count: u32,
    pub reset_time: i64, // epoch millis
}

impl RateWindow {
    pub fn fresh(now_ms: i64, window_ms: i64) -> Self {
        Self {
            count: 0,
            reset_time: now_ms.saturating_add(window_ms),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.reset_time
    }
}

// Text to explain, already trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    text: String,
}

impl AnalysisRequest {
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self { text: text.to_string() })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

// Inbound trigger - either the context menu or a forwarded page selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum Trigger {
    #[serde(rename_all = "camelCase")]
    ContextMenu {
        menu_item_id: String,
        #[serde(default)]
        selection_text: Option<String>,
        #[serde(default)]
        tab_id: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Selection {
        text: String,
        #[serde(default)]
        tab_id: Option<i64>,
    },
}

impl Trigger {
    // Returns `None` when the trigger should not start a run.
    pub fn into_request(self) -> Option<(AnalysisRequest, Option<i64>)> {
        match self {
            Trigger::ContextMenu {
                menu_item_id,
                selection_text,
                tab_id,
            } => {
                if menu_item_id != EXPLAIN_MENU_ITEM {
                    return None;
                }
                let request = AnalysisRequest::new(selection_text.as_deref()?)?;
                Some((request, tab_id))
            }
            Trigger::Selection { text, tab_id } => {
                AnalysisRequest::new(&text).map(|request| (request, tab_id))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupKind {
    Loading,
    Response,
    Error,
}

// Message for the popup renderer on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupMessage {
    pub action: String,
    #[serde(rename = "type")]
    pub kind: PopupKind,
    pub content: String,
    pub tab_id: Option<i64>,
    pub auto_dismiss_ms: Option<u64>,
}

impl PopupMessage {
    fn new(kind: PopupKind, content: impl Into<String>, tab_id: Option<i64>) -> Self {
        let auto_dismiss_ms = match kind {
            PopupKind::Response => Some(RESPONSE_AUTO_DISMISS.as_millis() as u64),
            PopupKind::Loading | PopupKind::Error => None,
        };
        Self {
            action: "showPopup".to_string(),
            kind,
            content: content.into(),
            tab_id,
            auto_dismiss_ms,
        }
    }

    pub fn loading(tab_id: Option<i64>) -> Self {
        Self::new(PopupKind::Loading, LOADING_MESSAGE, tab_id)
    }

    pub fn response(content: impl Into<String>, tab_id: Option<i64>) -> Self {
        Self::new(PopupKind::Response, content, tab_id)
    }

    pub fn error(content: impl Into<String>, tab_id: Option<i64>) -> Self {
        Self::new(PopupKind::Error, content, tab_id)
    }
}

// Gemini generateContent request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 500,
        }
    }
}
