// Selection binder - forwards user-driven value changes to the external
// state sink
//
// The contract is deliberately one-directional: exactly one `set(key, value)`
// per user-driven change event, and the core never reads back from the sink.
// The sink's own consistency model governs propagation from there.

use std::sync::Arc;

use crate::config::SelectConfig;
use crate::widget::WidgetHost;

/// Write interface of the external reactive state holder.
///
/// Implementations are expected to be cheap and non-blocking; the binder
/// calls `set` directly on the event path.
pub trait StateSink: Send + Sync {
    fn set(&self, key: &str, value: &str);
}

/// Resolve the key selection values are written under.
///
/// Reactive-model binding uses the key already declared on the element;
/// a control configured for reactive binding that declares no key falls
/// back to its own id, same as the non-reactive case.
pub fn resolve_binding_target(config: &SelectConfig, host: &dyn WidgetHost) -> String {
    if config.use_reactive_binding {
        if let Some(key) = host.reactive_key(&config.control_id) {
            return key;
        }
        tracing::warn!(
            control_id = %config.control_id,
            "Reactive binding requested but no key declared; using control id"
        );
    }
    config.control_id.clone()
}

/// Binds one control's selection to the sink under a resolved key
pub struct SelectionBinder {
    sink: Arc<dyn StateSink>,
    key: String,
}

impl SelectionBinder {
    pub fn new(sink: Arc<dyn StateSink>, key: String) -> Self {
        Self { sink, key }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Push the current selection to the sink. A cleared selection is
    /// written as the empty value so clears also count as exactly one write.
    pub fn push(&self, value: Option<&str>) {
        let value = value.unwrap_or("");
        tracing::debug!(key = %self.key, value, "Selection written to sink");
        self.sink.set(&self.key, value);
    }
}
