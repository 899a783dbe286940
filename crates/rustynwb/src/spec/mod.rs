//! Schema namespaces cached into every file under `/specifications`.
//!
//! Each [`Namespace`] carries its name, version and the JSON texts of its
//! schema files. The process-wide [`NamespaceRegistry`] starts with the
//! `core`, `hdmf-common` and `hdmf-experimental` namespaces; extensions can
//! be added with [`register_namespace`].

mod schema;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the schema source holding the namespace document itself.
pub const NAMESPACE_SOURCE: &str = "namespace";

/// A versioned schema namespace and its cached schema texts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub name: &'static str,
    pub version: &'static str,
    /// `(source name, JSON text)` pairs, namespace document first.
    pub sources: &'static [(&'static str, &'static str)],
}

pub const CORE: Namespace = Namespace {
    name: "core",
    version: schema::CORE_VERSION,
    sources: &[
        (NAMESPACE_SOURCE, schema::CORE_NAMESPACE),
        ("nwb.base", schema::CORE_BASE),
        ("nwb.device", schema::CORE_DEVICE),
        ("nwb.ecephys", schema::CORE_ECEPHYS),
        ("nwb.misc", schema::CORE_MISC),
        ("nwb.file", schema::CORE_FILE),
    ],
};

pub const HDMF_COMMON: Namespace = Namespace {
    name: "hdmf-common",
    version: schema::HDMF_COMMON_VERSION,
    sources: &[
        (NAMESPACE_SOURCE, schema::HDMF_COMMON_NAMESPACE),
        ("base", schema::HDMF_COMMON_BASE),
        ("table", schema::HDMF_COMMON_TABLE),
    ],
};

pub const HDMF_EXPERIMENTAL: Namespace = Namespace {
    name: "hdmf-experimental",
    version: schema::HDMF_EXPERIMENTAL_VERSION,
    sources: &[
        (NAMESPACE_SOURCE, schema::HDMF_EXPERIMENTAL_NAMESPACE),
        ("experimental", schema::HDMF_EXPERIMENTAL_EXPERIMENTAL),
        ("resources", schema::HDMF_EXPERIMENTAL_RESOURCES),
    ],
};

#[derive(Debug, Deserialize)]
struct NamespaceDocument {
    namespaces: Vec<NamespaceEntry>,
}

#[derive(Debug, Deserialize)]
struct NamespaceEntry {
    name: String,
    version: String,
    #[serde(default)]
    schema: Vec<SchemaEntry>,
}

/// One entry of a namespace's `schema` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    /// A schema file of this namespace.
    Source { source: String },
    /// Another namespace this one builds on.
    Namespace { namespace: String },
}

#[derive(Debug, Default, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    groups: Vec<TypeSpec>,
    #[serde(default)]
    datasets: Vec<TypeSpec>,
}

#[derive(Debug, Deserialize)]
struct TypeSpec {
    #[serde(alias = "neurodata_type_def")]
    data_type_def: Option<String>,
    #[serde(alias = "neurodata_type_inc")]
    data_type_inc: Option<String>,
}

/// A type defined by a schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    /// The type it extends, if any.
    pub parent: Option<String>,
    /// True for group types, false for dataset types.
    pub is_group: bool,
}

fn parse<'a, T: Deserialize<'a>>(what: &str, text: &'a str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| Error::Backend(format!("{what}: {e}")))
}

impl Namespace {
    /// JSON text of a schema source, or `None` if this namespace has no
    /// source by that name.
    pub fn source(&self, name: &str) -> Option<&'static str> {
        self.sources
            .iter()
            .find(|(source, _)| *source == name)
            .map(|(_, text)| *text)
    }

    /// The `schema` list of this namespace's own namespace document.
    pub fn schema_entries(&self) -> Result<Vec<SchemaEntry>> {
        let text = self.source(NAMESPACE_SOURCE).ok_or_else(|| {
            Error::Backend(format!("{}: no namespace document", self.name))
        })?;
        let document: NamespaceDocument = parse(self.name, text)?;
        let entry = document
            .namespaces
            .into_iter()
            .find(|n| n.name == self.name)
            .ok_or_else(|| {
                Error::Backend(format!("{}: namespace document does not declare it", self.name))
            })?;
        if entry.version != self.version {
            return Err(Error::Backend(format!(
                "{}: document version {} does not match {}",
                self.name, entry.version, self.version
            )));
        }
        Ok(entry.schema)
    }

    /// Names of the namespaces this one includes.
    pub fn dependencies(&self) -> Result<Vec<String>> {
        Ok(self
            .schema_entries()?
            .into_iter()
            .filter_map(|entry| match entry {
                SchemaEntry::Namespace { namespace } => Some(namespace),
                SchemaEntry::Source { .. } => None,
            })
            .collect())
    }

    /// Every type defined in this namespace's schema sources.
    pub fn data_types(&self) -> Result<Vec<TypeDef>> {
        let mut types = Vec::new();
        for (source, text) in self.sources {
            if *source == NAMESPACE_SOURCE {
                continue;
            }
            let document: SchemaDocument = parse(source, text)?;
            for (specs, is_group) in [(document.groups, true), (document.datasets, false)] {
                types.extend(specs.into_iter().filter_map(|spec| {
                    spec.data_type_def.map(|name| TypeDef {
                        name,
                        parent: spec.data_type_inc,
                        is_group,
                    })
                }));
            }
        }
        Ok(types)
    }
}

/// Process-wide set of namespaces, keyed by name.
#[derive(Debug)]
pub struct NamespaceRegistry {
    namespaces: RwLock<BTreeMap<&'static str, Namespace>>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        let registry = Self {
            namespaces: RwLock::new(BTreeMap::new()),
        };
        for namespace in [CORE, HDMF_COMMON, HDMF_EXPERIMENTAL] {
            registry.register(namespace);
        }
        registry
    }
}

impl NamespaceRegistry {
    /// Add a namespace, replacing any earlier one with the same name.
    pub fn register(&self, namespace: Namespace) {
        if let Some(old) = self.namespaces.write().insert(namespace.name, namespace) {
            debug!(
                namespace = namespace.name,
                old = old.version,
                new = namespace.version,
                "namespace replaced"
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<Namespace> {
        self.namespaces.read().get(name).copied()
    }

    /// All namespaces, sorted by name.
    pub fn all(&self) -> Vec<Namespace> {
        self.namespaces.read().values().copied().collect()
    }
}

static NAMESPACES: LazyLock<NamespaceRegistry> = LazyLock::new(NamespaceRegistry::default);

/// The global namespace registry.
pub fn namespaces() -> &'static NamespaceRegistry {
    &NAMESPACES
}

pub fn register_namespace(namespace: Namespace) {
    NAMESPACES.register(namespace);
}
