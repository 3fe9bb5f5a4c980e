//! The detector type registry: maps a configured `detector_type` string to
//! a factory that constructs the matching adapter.
//!
//! Grounded on `examples/original_source/src/core/firewall.py`'s
//! `guard_registry`/`register_guard`/`initialize` — a plain
//! type-string-to-constructor map, populated with the two adapters
//! shipped in the current deployment and open to new entries via
//! [`DetectorRegistry::register`], matching spec.md's "new adapters plug
//! in by implementing the contract and registering a type name with the
//! orchestrator".

use std::collections::HashMap;
use std::sync::Arc;

use super::{Backend, DetectorAdapter, PrimaryAdapter, SecondaryAdapter, StaticBackend};
use crate::config::DetectorConfig;

/// Builds one [`DetectorAdapter`] from its slot configuration.
pub type DetectorFactory = Arc<dyn Fn(&DetectorConfig) -> Arc<dyn DetectorAdapter> + Send + Sync>;

/// A type-string-keyed table of detector constructors, consulted by
/// [`crate::orchestrator::Gateway::new`] for every enabled slot in
/// [`crate::config::GatewayConfig::detectors`].
#[derive(Default)]
pub struct DetectorRegistry {
    factories: HashMap<String, DetectorFactory>,
}

impl DetectorRegistry {
    /// An empty registry with no known detector types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry pre-populated with the two adapters shipped in the
    /// current deployment (`"primary"`, `"secondary"`), each wired to the
    /// no-network [`StaticBackend::always_safe`] default since the wire
    /// protocol to a real backend is out of scope — embedders register
    /// their own factory for a real backend via [`Self::register`].
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register("primary", |cfg: &DetectorConfig| {
                Arc::new(PrimaryAdapter::new(
                    cfg.effective_id().to_string(),
                    Arc::new(StaticBackend::always_safe()) as Arc<dyn Backend>,
                )) as Arc<dyn DetectorAdapter>
            })
            .register("secondary", |cfg: &DetectorConfig| {
                Arc::new(SecondaryAdapter::new(
                    cfg.effective_id().to_string(),
                    Arc::new(StaticBackend::always_safe()) as Arc<dyn Backend>,
                )) as Arc<dyn DetectorAdapter>
            })
    }

    /// Register (or replace) the factory for `detector_type`.
    #[must_use]
    pub fn register(
        mut self,
        detector_type: impl Into<String>,
        factory: impl Fn(&DetectorConfig) -> Arc<dyn DetectorAdapter> + Send + Sync + 'static,
    ) -> Self {
        self.factories.insert(detector_type.into(), Arc::new(factory));
        self
    }

    /// Look up and invoke the factory for `slot.detector_type`.
    ///
    /// # Errors
    ///
    /// Returns [`super::DetectorError::UnknownType`] if no factory is
    /// registered for the slot's type. Callers should log this as a
    /// warning and continue, per SPEC_FULL §6 — an unknown type is
    /// skipped, not a fatal misconfiguration.
    pub fn build(&self, slot: &DetectorConfig) -> Result<Arc<dyn DetectorAdapter>, super::DetectorError> {
        self.factories
            .get(&slot.detector_type)
            .map(|factory| factory(slot))
            .ok_or_else(|| super::DetectorError::UnknownType {
                detector_type: slot.detector_type.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorRole;

    fn slot(detector_type: &str, enabled: bool) -> DetectorConfig {
        DetectorConfig {
            detector_type: detector_type.to_string(),
            enabled,
            role: DetectorRole::Unspecified,
            id: None,
        }
    }

    #[test]
    fn builds_known_types() {
        let registry = DetectorRegistry::with_defaults();
        assert!(registry.build(&slot("primary", true)).is_ok());
        assert!(registry.build(&slot("secondary", true)).is_ok());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = DetectorRegistry::with_defaults();
        let err = registry.build(&slot("nonexistent", true));
        assert!(matches!(
            err,
            Err(super::super::DetectorError::UnknownType { .. })
        ));
    }

    #[test]
    fn custom_registration_overrides_default() {
        let registry = DetectorRegistry::new().register("primary", |cfg: &DetectorConfig| {
            Arc::new(PrimaryAdapter::new(
                cfg.effective_id().to_string(),
                Arc::new(StaticBackend::constant("unsafe\nS1")) as Arc<dyn Backend>,
            )) as Arc<dyn DetectorAdapter>
        });
        let adapter = registry.build(&slot("primary", true)).unwrap();
        assert_eq!(adapter.id(), "primary");
    }

    #[test]
    fn effective_id_falls_back_to_detector_type() {
        let mut cfg = slot("primary", true);
        cfg.id = Some("guard-east-1".to_string());
        assert_eq!(cfg.effective_id(), "guard-east-1");
        assert_eq!(slot("primary", true).effective_id(), "primary");
    }
}
