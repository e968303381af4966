// Instance registry - at most one live widget instance per control id
//
// An explicit owned mapping held by the lifecycle controller, not
// process-global state. Destroy is idempotent: detaching a control that was
// never attached is a no-op, and no other control's state is touched.

use std::collections::HashMap;

use crate::widget::{WidgetHost, WidgetInstance};

/// Owned map of active widget instances, keyed by control id
#[derive(Default)]
pub struct InstanceRegistry {
    instances: HashMap<String, WidgetInstance>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a widget instance is currently active for the control
    pub fn has(&self, control_id: &str) -> bool {
        self.instances.contains_key(control_id)
    }

    pub fn get(&self, control_id: &str) -> Option<&WidgetInstance> {
        self.instances.get(control_id)
    }

    /// Register a freshly created instance, replacing any prior entry
    pub fn insert(&mut self, control_id: String, instance: WidgetInstance) {
        self.instances.insert(control_id, instance);
    }

    /// Detach and unregister the control's instance if one is active.
    /// Returns true when an instance was actually destroyed.
    pub fn destroy(&mut self, control_id: &str, host: &dyn WidgetHost) -> bool {
        match self.instances.remove(control_id) {
            Some(_) => {
                host.detach(control_id);
                tracing::debug!(control_id, "Widget instance destroyed");
                true
            }
            None => false,
        }
    }

    /// Configs of every registered control, for refresh re-initialization
    pub fn configs(&self) -> Vec<crate::config::SelectConfig> {
        self.instances.values().map(|i| i.config().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}
