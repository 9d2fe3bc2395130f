//! Collects non-fatal problems found while laying out and decorating a tree.
//!
//! Components receive a `&mut Diagnostics` instead of logging directly, so a
//! run can report every unresolved identifier exactly once at the end.

use std::collections::BTreeSet;

use log::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub component: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
    unresolved: BTreeSet<(&'static str, String)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and forward it to the logger.
    pub fn warn(&mut self, component: &'static str, message: impl Into<String>) {
        let message = message.into();
        warn!("[{component}] {message}");
        self.warnings.push(Warning { component, message });
    }

    /// Record a lookup that did not match any node. Repeated reports of the
    /// same identifier from the same component are collapsed.
    pub fn unresolved(&mut self, component: &'static str, identifier: &str) {
        if self.unresolved.insert((component, identifier.to_string())) {
            warn!("[{component}] failed to identify node with label: {identifier}");
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn unresolved_identifiers(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.unresolved
            .iter()
            .map(|(component, id)| (*component, id.as_str()))
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.unresolved.is_empty()
    }

    /// Log one summary line per component listing every unresolved identifier.
    pub fn report(&self) {
        if self.unresolved.is_empty() {
            return;
        }

        let mut current: Option<&'static str> = None;
        let mut ids: Vec<&str> = Vec::new();
        for (component, id) in self.unresolved_identifiers() {
            if current.is_some_and(|c| c != component) {
                warn!(
                    "[{}] unresolved identifiers: {}",
                    current.unwrap_or_default(),
                    ids.join(", ")
                );
                ids.clear();
            }
            current = Some(component);
            ids.push(id);
        }
        if let Some(component) = current {
            warn!("[{component}] unresolved identifiers: {}", ids.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_identifiers_are_reported_once() {
        let mut diag = Diagnostics::new();
        diag.unresolved("LineageProps", "p__Missing");
        diag.unresolved("LineageProps", "p__Missing");
        diag.unresolved("CollapseProps", "p__Missing");

        let all: Vec<_> = diag.unresolved_identifiers().collect();
        assert_eq!(
            all,
            vec![("CollapseProps", "p__Missing"), ("LineageProps", "p__Missing")]
        );
        assert!(!diag.is_clean());
    }

    #[test]
    fn warnings_are_kept_in_order() {
        let mut diag = Diagnostics::new();
        diag.warn("ContourProps", "first");
        diag.warn("ContourProps", "second");
        let messages: Vec<_> = diag.warnings().iter().map(|w| w.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
