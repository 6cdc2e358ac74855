use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use tracing::{debug, info};

#[cfg(feature = "metrics")]
use chatops_metrics::{gauge, registry as registry_metrics};

use crate::{
    Error, Result,
    action::{Action, ActionDef},
};

#[derive(Default)]
struct Inner {
    /// Registration order, used for the full help listing.
    order: Vec<String>,
    actions: HashMap<String, Arc<Action>>,
}

/// Registry of all actions, keyed by name.
///
/// Registration normally completes before the first dispatch, but the map is
/// behind a read/write lock so late registrations are safe as well.
#[derive(Default)]
pub struct ActionRegistry {
    inner: RwLock<Inner>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `def` and store it, replacing any action with the same name.
    ///
    /// A replaced action keeps its position in the help listing.
    pub fn register(&self, def: ActionDef) -> Result<()> {
        let action = Arc::new(Action::try_from(&def)?);
        let name = action.name().to_string();
        let min_arity = action.min_arity();

        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if inner.actions.insert(name.clone(), action).is_some() {
            debug!(action = %name, "replaced existing action");
        } else {
            inner.order.push(name.clone());
        }

        #[cfg(feature = "metrics")]
        gauge!(registry_metrics::ACTIONS).set(inner.actions.len() as f64);

        info!(action = %name, min_arity, "registered action");
        Ok(())
    }

    /// Register each definition in order, stopping at the first invalid one.
    /// Actions registered before the failure stay registered.
    pub fn register_many(&self, defs: impl IntoIterator<Item = ActionDef>) -> Result<()> {
        for def in defs {
            self.register(def)?;
        }
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Action>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.actions.get(name).cloned()
    }

    /// Action names in registration order.
    pub fn names(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.order.clone()
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Help for one action, or for every action when `name` is `None`.
    ///
    /// The full listing is every block followed by a blank line, in
    /// registration order, and is empty when nothing is registered.
    pub fn help_text(&self, name: Option<&str>) -> Result<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());

        if let Some(name) = name {
            return inner
                .actions
                .get(name)
                .map(|action| action.help_block())
                .ok_or_else(|| Error::not_found(name));
        }

        let mut text = String::new();
        for action in inner.order.iter().filter_map(|n| inner.actions.get(n)) {
            text.push_str(&action.help_block());
            text.push_str("\n\n");
        }
        Ok(text)
    }
}
