//! Per-family annotation key registry.
//!
//! Every adapter registers the annotation keys it writes while the registry
//! is still exclusively owned at startup. After that the registry is shared
//! behind an `Arc` and only read, so there is no locking.

use std::collections::BTreeMap;

use crate::error::{CoreError, Result};

/// Annotation keys owned by one device family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAnnotationKeys {
    /// Pod annotation listing devices requested for allocation.
    pub in_request: String,
    /// Pod annotation listing devices actually allocated.
    pub supported: String,
    /// Node annotation used for the registration handshake.
    pub handshake: String,
}

/// Mapping from device family to its annotation keys.
#[derive(Debug, Clone, Default)]
pub struct AnnotationRegistry {
    families: BTreeMap<String, DeviceAnnotationKeys>,
}

impl AnnotationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the keys for a device family, replacing any earlier entry.
    pub fn register(&mut self, family: impl Into<String>, keys: DeviceAnnotationKeys) {
        self.families.insert(family.into(), keys);
    }

    /// Look up the keys for a family.
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&DeviceAnnotationKeys> {
        self.families.get(family)
    }

    /// Look up the keys for a family, failing if it was never registered.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnregisteredFamily`] for unknown families.
    pub fn keys(&self, family: &str) -> Result<&DeviceAnnotationKeys> {
        self.get(family)
            .ok_or_else(|| CoreError::UnregisteredFamily(family.to_string()))
    }

    /// The node handshake annotation key for a family.
    #[must_use]
    pub fn handshake_key(&self, family: &str) -> Option<&str> {
        self.get(family).map(|k| k.handshake.as_str())
    }

    /// Iterate over registered families in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DeviceAnnotationKeys)> {
        self.families.iter().map(|(f, k)| (f.as_str(), k))
    }

    /// Number of registered families.
    #[must_use]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Whether no family has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(handshake: &str) -> DeviceAnnotationKeys {
        DeviceAnnotationKeys {
            in_request: "hami.io/vgpu-devices-to-allocate".to_string(),
            supported: "hami.io/vgpu-devices-allocated".to_string(),
            handshake: handshake.to_string(),
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = AnnotationRegistry::new();
        assert!(registry.is_empty());

        registry.register("DCU", keys("hami.io/node-handshake-dcu"));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.handshake_key("DCU"),
            Some("hami.io/node-handshake-dcu")
        );
        let dcu = registry.keys("DCU").unwrap();
        assert_eq!(dcu.in_request, "hami.io/vgpu-devices-to-allocate");
        assert_eq!(dcu.supported, "hami.io/vgpu-devices-allocated");
        assert!(registry.get("NVIDIA").is_none());
    }

    #[test]
    fn unknown_family_is_an_error() {
        let registry = AnnotationRegistry::new();
        let err = registry.keys("DCU").unwrap_err();
        assert!(matches!(err, CoreError::UnregisteredFamily(f) if f == "DCU"));
    }

    #[test]
    fn re_registering_replaces_keys() {
        let mut registry = AnnotationRegistry::new();
        registry.register("DCU", keys("old"));
        registry.register("DCU", keys("new"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.handshake_key("DCU"), Some("new"));
    }
}
