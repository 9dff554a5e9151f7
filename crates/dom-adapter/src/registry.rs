//! Registry of rules inserted into the document at runtime.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use stylescope_core_types::RuleHandle;

use crate::cascade::CompiledRule;

#[derive(Clone, Debug)]
pub struct InjectedRule {
    pub source: String,
    pub compiled: CompiledRule,
}

/// Concurrent registry for injected rules. Later handles cascade after earlier ones.
pub struct InjectedRules {
    rules: DashMap<RuleHandle, InjectedRule>,
    next: AtomicU64,
}

impl InjectedRules {
    pub fn new() -> Self {
        Self {
            rules: DashMap::new(),
            next: AtomicU64::new(1),
        }
    }

    pub fn insert(&self, source: String, compiled: CompiledRule) -> RuleHandle {
        let handle = RuleHandle(self.next.fetch_add(1, Ordering::Relaxed));
        self.rules.insert(handle, InjectedRule { source, compiled });
        handle
    }

    pub fn remove(&self, handle: RuleHandle) -> Option<InjectedRule> {
        self.rules.remove(&handle).map(|(_, rule)| rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in insertion order, with cascade order shifted past `base`.
    pub fn ordered(&self, base: usize) -> Vec<CompiledRule> {
        let mut entries: Vec<(RuleHandle, CompiledRule)> = self
            .rules
            .iter()
            .map(|kv| (*kv.key(), kv.value().compiled.clone()))
            .collect();
        entries.sort_by_key(|(handle, _)| handle.0);
        entries
            .into_iter()
            .enumerate()
            .map(|(idx, (_, mut rule))| {
                rule.order = base + idx;
                rule
            })
            .collect()
    }

    pub fn sources(&self) -> Vec<String> {
        let mut entries: Vec<(u64, String)> = self
            .rules
            .iter()
            .map(|kv| (kv.key().0, kv.value().source.clone()))
            .collect();
        entries.sort_by_key(|(handle, _)| *handle);
        entries.into_iter().map(|(_, source)| source).collect()
    }
}

impl Default for InjectedRules {
    fn default() -> Self {
        Self::new()
    }
}
