//! Kernel registry.
//!
//! The registry holds the metadata of every available kernel and provides
//! lookup by ID and by domain for discovery tooling.

use crate::domain::Domain;
use crate::error::{AnalysisError, Result};
use crate::kernel::KernelMetadata;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

/// Registry statistics.
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Total number of registered kernels.
    pub total: usize,
    /// Kernels by domain.
    pub by_domain: HashMap<Domain, usize>,
}

/// Central registry for kernel metadata.
#[derive(Debug, Default)]
pub struct KernelRegistry {
    kernels: RwLock<BTreeMap<String, KernelMetadata>>,
}

impl KernelRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register kernel metadata.
    ///
    /// Fails if a kernel with the same ID is already present.
    pub fn register_metadata(&self, metadata: KernelMetadata) -> Result<()> {
        let mut kernels = self
            .kernels
            .write()
            .map_err(|_| AnalysisError::internal("kernel registry lock poisoned"))?;

        if kernels.contains_key(&metadata.id) {
            return Err(AnalysisError::KernelAlreadyRegistered(metadata.id));
        }

        debug!(kernel_id = %metadata.id, domain = %metadata.domain, "Registered kernel");
        kernels.insert(metadata.id.clone(), metadata);
        Ok(())
    }

    /// Look up a kernel by ID.
    pub fn get(&self, id: &str) -> Result<KernelMetadata> {
        self.kernels
            .read()
            .map_err(|_| AnalysisError::internal("kernel registry lock poisoned"))?
            .get(id)
            .cloned()
            .ok_or_else(|| AnalysisError::not_found(id))
    }

    /// All kernels, ordered by ID.
    #[must_use]
    pub fn all(&self) -> Vec<KernelMetadata> {
        self.kernels
            .read()
            .map(|k| k.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Kernels belonging to a domain, ordered by ID.
    #[must_use]
    pub fn by_domain(&self, domain: Domain) -> Vec<KernelMetadata> {
        self.all()
            .into_iter()
            .filter(|m| m.domain == domain)
            .collect()
    }

    /// Total number of registered kernels.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.kernels.read().map(|k| k.len()).unwrap_or(0)
    }

    /// Registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let all = self.all();
        let mut by_domain = HashMap::new();
        for meta in &all {
            *by_domain.entry(meta.domain).or_insert(0) += 1;
        }
        RegistryStats {
            total: all.len(),
            by_domain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = KernelRegistry::new();
        registry
            .register_metadata(KernelMetadata::new("graph/pagerank", Domain::GraphAnalytics))
            .unwrap();
        registry
            .register_metadata(KernelMetadata::new(
                "compliance/guild-correlation",
                Domain::Compliance,
            ))
            .unwrap();

        assert_eq!(registry.total_count(), 2);
        assert_eq!(registry.get("graph/pagerank").unwrap().domain, Domain::GraphAnalytics);
        assert_eq!(registry.by_domain(Domain::Compliance).len(), 1);
        assert_eq!(registry.stats().by_domain.get(&Domain::GraphAnalytics), Some(&1));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = KernelRegistry::new();
        let meta = KernelMetadata::new("graph/cycles", Domain::GraphAnalytics);
        registry.register_metadata(meta.clone()).unwrap();
        let err = registry.register_metadata(meta).unwrap_err();
        assert!(matches!(err, AnalysisError::KernelAlreadyRegistered(_)));
    }

    #[test]
    fn test_missing_kernel() {
        let registry = KernelRegistry::new();
        assert!(matches!(
            registry.get("graph/nope"),
            Err(AnalysisError::KernelNotFound(_))
        ));
    }
}
