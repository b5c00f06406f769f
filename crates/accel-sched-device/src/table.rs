//! Lookup table of device adapters.
//!
//! The table is built once at startup: every adapter registers its
//! annotation keys, the registry is frozen, and the adapters are constructed
//! against it. After that the table is shared read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use accel_sched_core::{AnnotationRegistry, ContainerDeviceRequest, PodDevices};
use k8s_openapi::api::core::v1::Container;
use tracing::info;

use crate::config::DeviceConfig;
use crate::dcu::DcuDevices;
use crate::devices::Devices;
use crate::node::NodeAnnotator;
use crate::Result;

/// Device adapters keyed by family name.
pub struct DeviceTable {
    registry: Arc<AnnotationRegistry>,
    devices: BTreeMap<&'static str, Arc<dyn Devices>>,
}

impl DeviceTable {
    /// Register and construct every known adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn init(config: &DeviceConfig, annotator: Arc<dyn NodeAnnotator>) -> Result<Self> {
        config.dcu.validate()?;

        let mut registry = AnnotationRegistry::new();
        DcuDevices::register(&mut registry);
        let registry = Arc::new(registry);

        let mut table = Self {
            registry: Arc::clone(&registry),
            devices: BTreeMap::new(),
        };
        table.insert(Arc::new(DcuDevices::new(
            config.dcu.clone(),
            registry,
            annotator,
        )?));

        info!(
            families = ?table.devices.keys().collect::<Vec<_>>(),
            "Initialized device adapters"
        );
        Ok(table)
    }

    fn insert(&mut self, device: Arc<dyn Devices>) {
        self.devices.insert(device.common_word(), device);
    }

    /// The frozen annotation key registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<AnnotationRegistry> {
        &self.registry
    }

    /// Look up the adapter for a family.
    #[must_use]
    pub fn get(&self, family: &str) -> Option<&Arc<dyn Devices>> {
        self.devices.get(family)
    }

    /// Iterate over adapters in family-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Arc<dyn Devices>)> {
        self.devices.iter().map(|(family, device)| (*family, device))
    }

    /// Number of adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the table has no adapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Whether any adapter wants to mutate this container at admission.
    #[must_use]
    pub fn mutate_admission(&self, container: &Container) -> bool {
        self.devices
            .values()
            .any(|device| device.mutate_admission(container))
    }

    /// Collect the container's requests, leaving out families it does not use.
    #[must_use]
    pub fn generate_resource_requests(
        &self,
        container: &Container,
    ) -> BTreeMap<&'static str, ContainerDeviceRequest> {
        self.devices
            .iter()
            .map(|(family, device)| (*family, device.generate_resource_requests(container)))
            .filter(|(_, request)| !request.is_empty())
            .collect()
    }

    /// Let every adapter record its assignment in the pod annotations.
    pub fn patch_annotations(
        &self,
        annotations: &mut BTreeMap<String, String>,
        pod_devices: &PodDevices,
    ) {
        for device in self.devices.values() {
            device.patch_annotations(annotations, pod_devices);
        }
    }
}
