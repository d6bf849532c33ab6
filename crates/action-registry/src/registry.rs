use crate::model::ActionSpec;
use std::collections::BTreeMap;
use tracing::debug;

/// Name -> spec map for one controller. Populated during setup, before any
/// request traffic, so it needs no locking.
pub struct ActionRegistry<S> {
    actions: BTreeMap<String, ActionSpec<S>>,
}

impl<S> Default for ActionRegistry<S> {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }
}

impl<S> ActionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `spec` under `name`. Last write wins; the replaced spec is returned.
    pub fn register(&mut self, name: impl Into<String>, spec: ActionSpec<S>) -> Option<ActionSpec<S>> {
        let name = name.into();
        let previous = self.actions.insert(name.clone(), spec);
        if previous.is_some() {
            debug!(action = %name, "action re-registered; previous spec replaced");
        }
        previous
    }

    pub fn get_all(&self) -> &BTreeMap<String, ActionSpec<S>> {
        &self.actions
    }

    pub fn get(&self, name: &str) -> Option<&ActionSpec<S>> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl<S> Clone for ActionRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
        }
    }
}
