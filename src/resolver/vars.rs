//! Variable table: `$UPPER_SNAKE_NAME` substitutions

use std::collections::BTreeMap;

use crate::resolver::escape;

/// A variable value: either a constant or a zero-argument producer run at
/// lookup time. Producers receive the full variable name, so one producer
/// can back a whole prefix family (such as the `$Q_*` query echoes).
pub enum VarSource {
    Text(String),
    Getter(Box<dyn Fn(&str) -> String + Send + Sync>),
}

/// Name to value mapping consulted for bare `$NAME` references. Lookups
/// never fail; an unknown name expands to the empty string. Values are
/// escaped on lookup so that delimiter characters inside variable content
/// survive expansion and reappear verbatim after the final unescape pass.
pub struct VarTable {
    vars: BTreeMap<String, VarSource>,
    prefixes: BTreeMap<String, VarSource>,
    debug: bool,
}

impl VarTable {
    pub fn new(debug: bool) -> VarTable {
        let mut table = VarTable {
            vars: BTreeMap::new(),
            prefixes: BTreeMap::new(),
            debug,
        };
        table.set("BR", "<br />");
        table
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.vars
            .insert(name.to_string(), VarSource::Text(value.into()));
    }

    pub fn set_getter<F>(&mut self, name: &str, getter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.vars
            .insert(name.to_string(), VarSource::Getter(Box::new(getter)));
    }

    /// Register a producer for every name starting with `prefix` followed
    /// by an underscore, e.g. prefix "Q" answers `$Q_ARTICLE`.
    pub fn set_prefix<F>(&mut self, prefix: &str, getter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.prefixes
            .insert(prefix.to_string(), VarSource::Getter(Box::new(getter)));
    }

    fn produce(source: &VarSource, name: &str) -> String {
        match source {
            VarSource::Text(value) => value.clone(),
            VarSource::Getter(getter) => getter(name),
        }
    }

    /// Look a variable up. Unknown names are the empty string.
    pub fn get(&self, name: &str) -> String {
        if name == "__DUMPVARS__" {
            if self.debug {
                return escape(&self.dump());
            }
            return String::new();
        }
        if let Some(source) = self
            .vars
            .get(name)
        {
            return escape(&Self::produce(source, name));
        }
        // Fall back to a prefix producer.
        if let Some(index) = name.find('_') {
            if index > 0 {
                if let Some(source) = self
                    .prefixes
                    .get(&name[..index])
                {
                    return escape(&Self::produce(source, name));
                }
            }
        }
        String::new()
    }

    /// Debugging helper behind `$__DUMPVARS__`: every variable and its
    /// current value, one per line, in name order.
    fn dump(&self) -> String {
        let mut lines = Vec::new();
        for (name, source) in &self.vars {
            lines.push(format!("{}\t=> {}", name, Self::produce(source, name)));
        }
        lines.join("\n")
    }
}
