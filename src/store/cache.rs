//! Macro body cache shared between concurrent renders

use std::collections::HashMap;
use std::sync::RwLock;

/// A cache of resolved macro lookups, keyed by scope and macro name.
/// Reads happen concurrently from many renders; `clear` is invoked at a
/// session boundary (one incoming request) to bound staleness.
#[derive(Debug, Default)]
pub struct MacroCache {
    entries: RwLock<HashMap<String, String>>,
}

fn cache_key(scope: &str, name: &str) -> String {
    format!("{scope}\x00{name}")
}

impl MacroCache {
    pub fn new() -> MacroCache {
        MacroCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, scope: &str, name: &str) -> Option<String> {
        let entries = self
            .entries
            .read()
            .expect("macro cache lock poisoned");
        entries
            .get(&cache_key(scope, name))
            .cloned()
    }

    pub fn put(&self, scope: &str, name: &str, body: &str) {
        let mut entries = self
            .entries
            .write()
            .expect("macro cache lock poisoned");
        entries.insert(cache_key(scope, name), body.to_string());
    }

    pub fn clear(&self) {
        let mut entries = self
            .entries
            .write()
            .expect("macro cache lock poisoned");
        entries.clear();
    }
}
