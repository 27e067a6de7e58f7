// ── Model requirement inference ──

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::trace;

use crate::model::ModelRequirement;

/// Model name → minimum known-good version.
///
/// Injected into the inspector so deployments and tests can supply their
/// own table.
#[derive(Debug, Clone, Default)]
pub struct ModelTable {
    entries: IndexMap<String, String>,
}

impl ModelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The OpenConfig models the built-in collectors rely on.
    pub fn openconfig() -> Self {
        Self::new()
            .with_model("openconfig-system", "0.17.1")
            .with_model("openconfig-interfaces", "4.0.0")
            .with_model("openconfig-network-instance", "1.3.0")
    }

    #[must_use]
    pub fn with_model(mut self, name: impl Into<String>, minimum_version: impl Into<String>) -> Self {
        self.entries.insert(name.into(), minimum_version.into());
        self
    }

    pub fn minimum_version(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Infers which models a set of request paths depends on.
#[derive(Debug, Clone)]
pub struct RequestInspector {
    table: Arc<ModelTable>,
}

impl Default for RequestInspector {
    fn default() -> Self {
        Self::new(Arc::new(ModelTable::openconfig()))
    }
}

impl RequestInspector {
    pub fn new(table: Arc<ModelTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ModelTable {
        &self.table
    }

    /// Requirements for every known model referenced by `paths`.
    ///
    /// Deduplicated by name, in first-seen order. Paths whose module is not
    /// in the table contribute nothing.
    pub fn infer_requirements<S: AsRef<str>>(&self, paths: &[S]) -> Vec<ModelRequirement> {
        let mut seen: IndexMap<&str, ModelRequirement> = IndexMap::new();
        for path in paths {
            let module = module_of(path.as_ref());
            if module.is_empty() || seen.contains_key(module.as_str()) {
                continue;
            }
            if let Some((name, min)) = self.table.entries.get_key_value(module.as_str()) {
                seen.insert(name.as_str(), ModelRequirement::new(name.clone(), min.clone()));
            } else {
                trace!(path = path.as_ref(), module = %module, "path module not in model table");
            }
        }
        seen.into_values().collect()
    }
}

/// Module prefix of a path.
///
/// `openconfig-interfaces:interfaces/interface[name=Gi0/0/0/0]/state`
/// → `openconfig-interfaces`. Key qualifiers are stripped first because
/// their values may contain `/` or `:`.
fn module_of(path: &str) -> String {
    let mut stripped = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(c),
            _ => {}
        }
    }

    let first = stripped
        .trim()
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    first
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
        .to_owned()
}
