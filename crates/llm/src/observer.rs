use serde_json::Value;
use tracing::info;

/// Receives the full raw payload of every completion and chat response.
pub trait ModelObserver: Send + Sync {
    fn on_response(&self, model: &str, output: &Value);
}

/// Logs each response as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ModelObserver for TracingObserver {
    fn on_response(&self, model: &str, output: &Value) {
        let rendered = serde_json::to_string_pretty(output).unwrap_or_else(|_| output.to_string());
        info!(model = model, "model output:\n{}", rendered);
    }
}
