//! Diagnostic channel for resource-loading notices.
//!
//! The store reports each [`LoadWarning`] once, when the category is first
//! loaded. What happens to it is up to the surrounding application.

use std::sync::Mutex;

use leafscan_core::{Category, LoadWarning, ResourceKind};
use tracing::warn;

pub trait DiagnosticSink: Send + Sync {
    fn notice(&self, warning: &LoadWarning);
}

/// Emits every notice as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn notice(&self, warning: &LoadWarning) {
        warn!(
            category = %warning.category,
            resource = %warning.resource,
            path = %warning.path.display(),
            "{warning}"
        );
    }
}

/// Keeps notices in memory so a front end can show them next to a result.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<LoadWarning>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notices recorded so far, oldest first.
    pub fn notices(&self) -> Vec<LoadWarning> {
        self.notices
            .lock()
            .map(|n| n.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn has_notice(&self, category: &Category, resource: ResourceKind) -> bool {
        self.notices()
            .iter()
            .any(|w| &w.category == category && w.resource == resource)
    }
}

impl DiagnosticSink for RecordingSink {
    fn notice(&self, warning: &LoadWarning) {
        let mut notices = self
            .notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        notices.push(warning.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        let tea = Category::new("tea");
        sink.notice(&LoadWarning::missing(&tea, ResourceKind::Model, PathBuf::from("a")));
        sink.notice(&LoadWarning::missing(&tea, ResourceKind::Advice, PathBuf::from("b")));

        let notices = sink.notices();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0].resource, ResourceKind::Model);
        assert!(sink.has_notice(&tea, ResourceKind::Advice));
        assert!(!sink.has_notice(&tea, ResourceKind::ClassMap));
    }
}
