use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::ParseResult;
use crate::ir::ClassRecord;
use crate::recorder::ClassEvents;
use crate::visitor::visit_class;

/// Namespaces indexed when none are configured.
pub(crate) const DEFAULT_NAMESPACES: [&str; 2] = ["net/minecraft", "com/mojang"];

/// Prefix allow-list applied to referenced symbols before they are recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NamespaceFilter {
    prefixes: Vec<String>,
}

impl NamespaceFilter {
    /// An empty prefix list accepts every symbol.
    pub(crate) fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn accepts(&self, symbol: &str) -> bool {
        self.prefixes.is_empty() || self.prefixes.iter().any(|prefix| symbol.starts_with(prefix))
    }

    pub(crate) fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACES)
    }
}

#[derive(Debug, Default)]
struct IndexState {
    usages: HashMap<String, HashSet<String>>,
    usage_count: u64,
    classes: HashMap<String, ClassRecord>,
}

impl IndexState {
    fn accept(&mut self, filter: &NamespaceFilter, symbol: &str, usage: &str) -> bool {
        if !filter.accepts(symbol) {
            return false;
        }
        self.usages
            .entry(symbol.to_string())
            .or_default()
            .insert(usage.to_string());
        self.usage_count += 1;
        true
    }
}

/// Session-wide usage and class index shared by all indexing workers.
#[derive(Debug)]
pub(crate) struct UsageIndex {
    filter: NamespaceFilter,
    state: Mutex<IndexState>,
}

impl UsageIndex {
    pub(crate) fn new(filter: NamespaceFilter) -> Self {
        Self {
            filter,
            state: Mutex::new(IndexState::default()),
        }
    }

    pub(crate) fn filter(&self) -> &NamespaceFilter {
        &self.filter
    }

    /// Record one usage of `symbol` described by `usage`. Returns whether the
    /// symbol passed the namespace filter.
    #[cfg(test)]
    pub(crate) fn accept(&self, symbol: &str, usage: &str) -> bool {
        self.lock().accept(&self.filter, symbol, usage)
    }

    /// Parse one class buffer and merge its events. A buffer that fails to
    /// parse leaves the index untouched.
    pub(crate) fn index(&self, data: &[u8]) -> ParseResult<String> {
        let mut events = ClassEvents::default();
        let class_name = visit_class(data, &mut events)?;

        let mut state = self.lock();
        let mut accepted = 0usize;
        for usage in &events.usages {
            if state.accept(&self.filter, &usage.symbol, &usage.usage) {
                accepted += 1;
            }
        }
        if let Some(record) = events.record {
            state.classes.insert(record.name.clone(), record);
        }
        drop(state);

        debug!(
            class = %class_name,
            references = events.usages.len(),
            accepted,
            "indexed class"
        );
        Ok(class_name)
    }

    /// Usage descriptors recorded for `symbol`, sorted.
    pub(crate) fn usages(&self, symbol: &str) -> Vec<String> {
        let state = self.lock();
        let mut usages: Vec<String> = state
            .usages
            .get(symbol)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        usages.sort();
        usages
    }

    pub(crate) fn usage_count(&self) -> u64 {
        self.lock().usage_count
    }

    /// Number of distinct referenced symbols.
    pub(crate) fn symbol_count(&self) -> usize {
        self.lock().usages.len()
    }

    pub(crate) fn class_count(&self) -> usize {
        self.lock().classes.len()
    }

    pub(crate) fn class_record(&self, name: &str) -> Option<ClassRecord> {
        self.lock().classes.get(name).cloned()
    }

    /// All class records as `name|super|flags|interfaces`, sorted by name.
    pub(crate) fn class_table(&self) -> Vec<String> {
        let state = self.lock();
        let mut records: Vec<&ClassRecord> = state.classes.values().collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records.into_iter().map(ClassRecord::table_row).collect()
    }

    /// Classes whose super class or interface list names `name`, sorted.
    pub(crate) fn direct_subtypes(&self, name: &str) -> Vec<String> {
        let state = self.lock();
        let mut subtypes: Vec<String> = state
            .classes
            .values()
            .filter(|record| record.extends_or_implements(name))
            .map(|record| record.name.clone())
            .collect();
        subtypes.sort();
        subtypes
    }

    /// Super class and interfaces of `name` as declared; empty when `name`
    /// was never recorded.
    pub(crate) fn supertypes(&self, name: &str) -> Vec<String> {
        let state = self.lock();
        state
            .classes
            .get(name)
            .map(|record| record.supertypes().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Every recorded class below `name` in the hierarchy, direct or not,
    /// sorted. `name` itself is excluded even when the graph is cyclic.
    pub(crate) fn all_subtypes(&self, name: &str) -> Vec<String> {
        let state = self.lock();
        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for record in state.classes.values() {
            for parent in record.supertypes() {
                children.entry(parent).or_default().push(&record.name);
            }
        }

        let mut found: BTreeSet<&str> = BTreeSet::new();
        let mut pending = vec![name];
        while let Some(current) = pending.pop() {
            for &child in children.get(current).into_iter().flatten() {
                if child != name && found.insert(child) {
                    pending.push(child);
                }
            }
        }
        found.into_iter().map(str::to_string).collect()
    }

    /// Topmost recorded class reached by following super classes from `name`.
    /// Stops at the first super class that was not indexed.
    pub(crate) fn hierarchy_root(&self, name: &str) -> String {
        let state = self.lock();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = name;
        while seen.insert(current) {
            match state
                .classes
                .get(current)
                .and_then(|record| record.super_name.as_deref())
            {
                Some(parent) if state.classes.contains_key(parent) => current = parent,
                _ => break,
            }
        }
        current.to_string()
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for UsageIndex {
    fn default() -> Self {
        Self::new(NamespaceFilter::default())
    }
}
