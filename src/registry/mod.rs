use crate::error::RegistryError;
use ahash::{AHashMap, AHashSet, RandomState};
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

pub mod builtin;
mod computation;
mod metadata;

pub use computation::*;
pub use metadata::*;

// Fixed seeds keep fingerprints stable between processes.
const FINGERPRINT_SEEDS: [u64; 4] = [
    0x6e61_6761_7265_0001,
    0x6e61_6761_7265_0002,
    0x6e61_6761_7265_0003,
    0x6e61_6761_7265_0004,
];

struct RegisteredKind {
    metadata: NodeMetadata,
    computation: Arc<dyn NodeComputation>,
}

/// Process-wide catalogue of node kinds.
///
/// Built once at startup and never mutated afterwards; share it behind an `Arc`
/// across every concurrent request.
pub struct TypeRegistry {
    kinds: AHashMap<String, RegisteredKind>,
}

impl TypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn metadata(&self, kind: &str) -> Option<&NodeMetadata> {
        self.kinds.get(kind).map(|k| &k.metadata)
    }

    pub fn computation(&self, kind: &str) -> Option<Arc<dyn NodeComputation>> {
        self.kinds.get(kind).map(|k| Arc::clone(&k.computation))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// All registered kinds, sorted by name.
    pub fn kinds(&self) -> Vec<&NodeMetadata> {
        let mut kinds: Vec<_> = self.kinds.values().map(|k| &k.metadata).collect();
        kinds.sort_by(|a, b| a.kind.cmp(&b.kind));
        kinds
    }

    /// A stable hash over every kind's handle declarations.
    pub fn fingerprint(&self) -> u64 {
        let state = RandomState::with_seeds(
            FINGERPRINT_SEEDS[0],
            FINGERPRINT_SEEDS[1],
            FINGERPRINT_SEEDS[2],
            FINGERPRINT_SEEDS[3],
        );
        let mut hasher = state.build_hasher();
        for metadata in self.kinds() {
            metadata.kind.hash(&mut hasher);
            for (direction, handles) in [("in", &metadata.inputs), ("out", &metadata.outputs)] {
                direction.hash(&mut hasher);
                for handle in handles {
                    handle.name.hash(&mut hasher);
                    handle.data_type.as_str().hash(&mut hasher);
                    handle.required.hash(&mut hasher);
                }
            }
        }
        hasher.finish()
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("kinds", &self.kinds().iter().map(|m| &m.kind).collect::<Vec<_>>())
            .finish()
    }
}

/// Collects kind registrations and validates them into a `TypeRegistry`.
pub struct RegistryBuilder {
    entries: Vec<(NodeMetadata, Arc<dyn NodeComputation>)>,
    aliases: Vec<(String, String)>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Adds the kinds shipped with the crate (`number`, `add`, `concat`, ...).
    pub fn with_builtin_kinds(self) -> Self {
        builtin::register_builtin_kinds(self)
    }

    pub fn register(self, metadata: NodeMetadata, computation: impl NodeComputation + 'static) -> Self {
        self.register_shared(metadata, Arc::new(computation))
    }

    pub fn register_shared(
        mut self,
        metadata: NodeMetadata,
        computation: Arc<dyn NodeComputation>,
    ) -> Self {
        self.entries.push((metadata, computation));
        self
    }

    /// Makes `alias` behave exactly like the already registered `existing_kind`.
    ///
    /// Editors often name kinds differently from the engine; an alias maps one onto
    /// the other without duplicating the computation.
    pub fn with_kind_alias(mut self, alias: &str, existing_kind: &str) -> Self {
        self.aliases
            .push((alias.to_string(), existing_kind.to_string()));
        self
    }

    /// Registers every kind described in a JSON catalogue (an array of `NodeMetadata`),
    /// binding computations by kind name through `resolve`.
    pub fn with_catalogue<F>(mut self, catalogue_json: &str, resolve: F) -> Result<Self, RegistryError>
    where
        F: Fn(&str) -> Option<Arc<dyn NodeComputation>>,
    {
        let catalogue: Vec<NodeMetadata> = serde_json::from_str(catalogue_json)
            .map_err(|e| RegistryError::CatalogueParseError(e.to_string()))?;
        for metadata in catalogue {
            let computation =
                resolve(&metadata.kind).ok_or_else(|| RegistryError::UnboundKind(metadata.kind.clone()))?;
            self.entries.push((metadata, computation));
        }
        Ok(self)
    }

    pub fn build(self) -> Result<TypeRegistry, RegistryError> {
        let mut kinds: AHashMap<String, RegisteredKind> = AHashMap::with_capacity(self.entries.len());

        for (metadata, computation) in self.entries {
            validate_metadata(&metadata)?;
            if kinds.contains_key(&metadata.kind) {
                return Err(RegistryError::DuplicateKind(metadata.kind));
            }
            kinds.insert(
                metadata.kind.clone(),
                RegisteredKind {
                    metadata,
                    computation,
                },
            );
        }

        for (alias, existing) in self.aliases {
            if alias.is_empty() {
                return Err(RegistryError::EmptyKind);
            }
            if kinds.contains_key(&alias) {
                return Err(RegistryError::DuplicateKind(alias));
            }
            let target = kinds
                .get(&existing)
                .ok_or_else(|| RegistryError::UnboundKind(existing.clone()))?;
            let mut metadata = target.metadata.clone();
            metadata.kind = alias.clone();
            let computation = Arc::clone(&target.computation);
            kinds.insert(
                alias,
                RegisteredKind {
                    metadata,
                    computation,
                },
            );
        }

        tracing::debug!(kinds = kinds.len(), "Type registry built");
        Ok(TypeRegistry { kinds })
    }
}

fn validate_metadata(metadata: &NodeMetadata) -> Result<(), RegistryError> {
    if metadata.kind.is_empty() {
        return Err(RegistryError::EmptyKind);
    }
    for (direction, handles) in [("input", &metadata.inputs), ("output", &metadata.outputs)] {
        let mut seen = AHashSet::new();
        for handle in handles {
            if !seen.insert(handle.name.as_str()) {
                return Err(RegistryError::DuplicateHandle {
                    kind: metadata.kind.clone(),
                    direction,
                    handle: handle.name.clone(),
                });
            }
        }
    }
    Ok(())
}
