use magpie::agent::Agent;
use std::sync::Arc;

/// Shared application state: one agent, built at startup, serving every
/// request. The agent holds only read-only state, so concurrent turns are
/// independent.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<Agent>,
}
