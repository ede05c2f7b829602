use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Histogram, TextEncoder, register_counter, register_counter_vec,
    register_histogram,
};


lazy_static! {
    pub static ref ANALYSIS_RUNS: Counter =
        register_counter!("explainer_runs_total", "Total number of analysis runs").unwrap();
    pub static ref LOCAL_DENIALS: Counter = register_counter!(
        "explainer_local_denials_total",
        "Runs denied by the local quota"
    )
    .unwrap();
    pub static ref MISSING_CREDENTIALS: Counter = register_counter!(
        "explainer_missing_credentials_total",
        "Calls refused locally because no api key is stored"
    )
    .unwrap();
    pub static ref PROVIDER_OUTCOMES: CounterVec = register_counter_vec!(
        "explainer_provider_outcomes_total",
        "Gateway call outcomes by kind",
        &["outcome"]
    )
    .unwrap();
    pub static ref PROVIDER_LATENCY: Histogram = register_histogram!(
        "explainer_provider_latency_seconds",
        "Gemini request latency in seconds"
    )
    .unwrap();
}

// Text exposition of everything registered above
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
