//! Resource definitions known to the simulation.
//!
//! Register every resource once on a [`ResourceLibraryBuilder`], then
//! [`build`](ResourceLibraryBuilder::build) an immutable [`ResourceLibrary`].
//! The library validates names when rate strings are parsed, through the
//! [`ResourceLookup`] trait.

use crate::id::ResourceId;
use std::collections::HashMap;

/// How a resource is stored on a vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResourceKind {
    /// Held in part containers; amount and capacity are aggregated from parts.
    Stored,
    /// Pseudo-resource with no part storage (heat, data throughput...).
    Virtual,
}

/// A resource definition in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDef {
    pub name: String,
    pub kind: ResourceKind,
}

/// Read-only lookup used to validate resource names, e.g. while parsing
/// rate strings.
pub trait ResourceLookup {
    fn contains(&self, name: &str) -> bool;
}

/// Builder for constructing an immutable [`ResourceLibrary`].
#[derive(Debug, Default)]
pub struct ResourceLibraryBuilder {
    resources: Vec<ResourceDef>,
}

impl ResourceLibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource definition. Returns the id it will have in the
    /// built library.
    pub fn register(&mut self, name: &str, kind: ResourceKind) -> ResourceId {
        let id = ResourceId(self.resources.len() as u32);
        self.resources.push(ResourceDef {
            name: name.to_string(),
            kind,
        });
        id
    }

    /// Chainable variant of [`register`](Self::register).
    pub fn with(mut self, name: &str, kind: ResourceKind) -> Self {
        self.register(name, kind);
        self
    }

    /// Finalize and build the immutable library.
    pub fn build(self) -> Result<ResourceLibrary, LibraryError> {
        let mut name_to_id = HashMap::with_capacity(self.resources.len());
        for (index, def) in self.resources.iter().enumerate() {
            if def.name.trim().is_empty() {
                return Err(LibraryError::EmptyName(ResourceId(index as u32)));
            }
            if name_to_id
                .insert(def.name.clone(), ResourceId(index as u32))
                .is_some()
            {
                return Err(LibraryError::Duplicate(def.name.clone()));
            }
        }

        Ok(ResourceLibrary {
            resources: self.resources,
            name_to_id,
        })
    }
}

/// Immutable resource library. Frozen after build(). Thread-safe to share.
#[derive(Debug, Clone)]
pub struct ResourceLibrary {
    resources: Vec<ResourceDef>,
    name_to_id: HashMap<String, ResourceId>,
}

impl ResourceLibrary {
    /// Convenience constructor: every name becomes a [`ResourceKind::Stored`]
    /// resource.
    pub fn from_names<'a, I>(names: I) -> Result<Self, LibraryError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = ResourceLibraryBuilder::new();
        for name in names {
            builder.register(name, ResourceKind::Stored);
        }
        builder.build()
    }

    pub fn get(&self, id: ResourceId) -> Option<&ResourceDef> {
        self.resources.get(id.0 as usize)
    }

    pub fn id(&self, name: &str) -> Option<ResourceId> {
        self.name_to_id.get(name).copied()
    }

    pub fn kind(&self, name: &str) -> Option<ResourceKind> {
        self.id(name).and_then(|id| self.get(id)).map(|def| def.kind)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, &ResourceDef)> {
        self.resources
            .iter()
            .enumerate()
            .map(|(i, def)| (ResourceId(i as u32), def))
    }
}

impl ResourceLookup for ResourceLibrary {
    fn contains(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("duplicate resource name: {0}")]
    Duplicate(String),
    #[error("resource {0:?} has an empty name")]
    EmptyName(ResourceId),
}
