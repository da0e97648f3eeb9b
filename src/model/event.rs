//! Eligibility events

use serde::{Deserialize, Serialize};

/// A "may this resource be promoted" signal from the backend event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityEvent {
    pub resource_name: String,
    #[serde(default)]
    pub may_promote: bool,
}

impl EligibilityEvent {
    pub fn new(resource_name: impl Into<String>, may_promote: bool) -> Self {
        Self {
            resource_name: resource_name.into(),
            may_promote,
        }
    }

    /// Shorthand for a positive signal
    pub fn promotable(resource_name: impl Into<String>) -> Self {
        Self::new(resource_name, true)
    }

    /// Only positive signals are acted upon
    pub fn is_actionable(&self) -> bool {
        self.may_promote
    }
}
