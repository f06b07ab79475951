//! In-memory model of a parsed registry hive.

use std::collections::BTreeMap;

/// Value sentinel that removes a key instead of setting it.
pub const DELETE_SENTINEL: &str = "!prefixer_remove!";

/// Expected-value sentinel meaning "key must be absent" in registry
/// condition checks.
pub const NONE_SENTINEL: &str = "!prefixer_none!";

/// Architecture assumed when a hive carries no `#arch=` directive.
pub const DEFAULT_ARCH: &str = "win32";

/// Quote a bare string as a registry string value, escaping embedded
/// backslashes and double quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A single node (key path) within a hive.
///
/// Values map a name to a raw, *already-formatted* value string — the
/// quoting or `dword:`/`hex:` marker is part of the stored string and is
/// never decoded further. The name `@` denotes the node's unnamed default
/// value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryNode {
    /// Node path, case-sensitive, with doubled backslashes as separators.
    pub path: String,
    /// Last-modified timestamp in Unix seconds.
    pub timestamp: i64,
    /// Whether the node was modified since parse; stamped at serialization.
    pub changed: bool,
    values: BTreeMap<String, String>,
}

impl RegistryNode {
    /// Create an empty node.
    #[must_use]
    pub fn new(path: impl Into<String>, timestamp: i64) -> Self {
        Self {
            path: path.into(),
            timestamp,
            changed: false,
            values: BTreeMap::new(),
        }
    }

    /// Look up a raw value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Set a raw value, marking the node changed.
    ///
    /// Setting a name to [`DELETE_SENTINEL`] removes it entirely; setting an
    /// existing name overwrites it.
    pub fn set(&mut self, name: &str, value: &str) {
        self.changed = true;
        if value == DELETE_SENTINEL {
            self.values.remove(name);
        } else {
            self.values.insert(name.to_string(), value.to_string());
        }
    }

    /// Insert a value without touching the `changed` flag.
    ///
    /// Used by the parser: loaded values are, by definition, not yet
    /// "changed".
    pub(crate) fn insert_parsed(&mut self, name: String, value: String) {
        self.values.insert(name, value);
    }

    /// Append a continuation fragment to an existing value, newline-joined.
    pub(crate) fn append_continuation(&mut self, name: &str, fragment: &str) {
        if let Some(v) = self.values.get_mut(name) {
            v.push('\n');
            v.push_str(fragment);
        }
    }

    /// Iterate values in sorted name order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the node holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of values on this node.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// A parsed registry hive: header lines, architecture, and its nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryHive {
    /// Format banner, e.g. `WINE REGISTRY Version 2`.
    pub header: String,
    /// The "all keys relative to …" comment line, preserved verbatim.
    pub relative: String,
    /// Prefix bitness (`win32` or `win64`).
    pub arch: String,
    nodes: BTreeMap<String, RegistryNode>,
}

impl RegistryHive {
    /// Create an empty hive with the given header lines.
    #[must_use]
    pub fn new(header: impl Into<String>, relative: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            relative: relative.into(),
            arch: DEFAULT_ARCH.to_string(),
            nodes: BTreeMap::new(),
        }
    }

    /// Look up a node by path.
    #[must_use]
    pub fn node(&self, path: &str) -> Option<&RegistryNode> {
        self.nodes.get(path)
    }

    /// Look up a node mutably by path.
    pub fn node_mut(&mut self, path: &str) -> Option<&mut RegistryNode> {
        self.nodes.get_mut(path)
    }

    /// Return the node at `path`, creating an empty one if absent.
    pub fn ensure_node(&mut self, path: &str) -> &mut RegistryNode {
        self.nodes
            .entry(path.to_string())
            .or_insert_with(|| RegistryNode::new(path, 0))
    }

    /// Insert a node, replacing any existing node at the same path.
    pub fn insert(&mut self, node: RegistryNode) {
        self.nodes.insert(node.path.clone(), node);
    }

    /// Iterate nodes in sorted path order.
    pub fn nodes(&self) -> impl Iterator<Item = &RegistryNode> {
        self.nodes.values()
    }

    /// Number of nodes in the hive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the hive holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
