use std::sync::Arc;
use crate::analyzer::Analyzer;
use crate::store::CounterStore;
// app's shared state

pub struct AppState {
    pub analyzer: Analyzer,
    pub store: Arc<dyn CounterStore>, // same store the analyzer's limiter owns
}
