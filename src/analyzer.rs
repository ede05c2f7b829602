// One explanation run: quota check -> provider call -> record -> deliver
// (denied runs skip straight to deliver). Runs are not serialized.

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::error::{AnalysisFailure, AnalysisResult};
use crate::gemini::GeminiClient;
use crate::metrics::{ANALYSIS_RUNS, LOCAL_DENIALS};
use crate::models::{AnalysisRequest, PopupMessage};
use crate::rate_limit::RateLimiter;
use crate::store::{CounterStore, StoreError};

// Receiver side of the popup messages a run emits.
pub trait PopupSink: Send + Sync {
    fn deliver(&self, message: PopupMessage);
}

impl PopupSink for mpsc::UnboundedSender<PopupMessage> {
    fn deliver(&self, message: PopupMessage) {
        // the page may be gone already
        let _ = self.send(message);
    }
}

pub struct Analyzer {
    store: Arc<dyn CounterStore>,
    limiter: RateLimiter,
    gemini: GeminiClient,
    clock: Arc<dyn Clock>,
}

impl Analyzer {
    pub fn new(
        store: Arc<dyn CounterStore>,
        limiter: RateLimiter,
        gemini: GeminiClient,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            limiter,
            gemini,
            clock,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    // Run to completion. The final `response` or `error` popup is delivered
    // exactly once; a `loading` popup precedes it when the call was admitted.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        tab_id: Option<i64>,
        popups: &dyn PopupSink,
    ) -> AnalysisResult {
        ANALYSIS_RUNS.inc();

        let result = match self.execute(request, tab_id, popups).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "analysis run aborted by store failure");
                Err(AnalysisFailure::internal())
            }
        };

        let message = match &result {
            Ok(analysis) => PopupMessage::response(analysis.clone(), tab_id),
            Err(failure) => PopupMessage::error(failure.message.clone(), tab_id),
        };
        popups.deliver(message);
        result
    }

    async fn execute(
        &self,
        request: &AnalysisRequest,
        tab_id: Option<i64>,
        popups: &dyn PopupSink,
    ) -> Result<AnalysisResult, StoreError> {
        let admission = self.limiter.check_admission(self.clock.now_millis()).await?;
        if !admission.admitted {
            LOCAL_DENIALS.inc();
            info!(reset_time = admission.reset_time, "local quota exhausted");
            let config = self.limiter.config();
            return Ok(Err(AnalysisFailure::local_rate_limited(
                config.max_requests,
                &config.window_phrase(),
            )));
        }

        popups.deliver(PopupMessage::loading(tab_id));

        let api_key = self.store.load_api_key().await?;
        let result = self.gemini.analyze(request.text(), api_key.as_deref()).await;

        // failed calls use quota too
        match self.limiter.record_request(self.clock.now_millis()).await {
            Ok(window) => info!(
                count = window.count,
                remaining = admission.remaining.saturating_sub(1),
                ok = result.is_ok(),
                "analysis finished"
            ),
            Err(e) => warn!(error = %e, "could not record request"),
        }

        Ok(result)
    }
}
