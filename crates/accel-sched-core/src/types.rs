//! Device data model shared by every adapter.
//!
//! These records travel between node registration, the scheduler and pod
//! annotations. Field names follow the annotation wire format so the codec
//! stays a direct mapping.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A physical device advertised by a node in its registration annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Vendor-assigned device identifier (usually a UUID).
    pub id: String,
    /// How many containers may share this device.
    pub count: i32,
    /// Total device memory in MiB.
    pub devmem: i32,
    /// Total compute cores, as a percentage of the device.
    pub devcore: i32,
    /// Advertised model string, e.g. `"DCU-K100"`.
    pub device_type: String,
    /// NUMA node the device is attached to.
    pub numa: i32,
    /// Whether the device plugin reports the device as healthy.
    pub health: bool,
}

/// Scheduler-side view of a device while a pod is being placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceUsage {
    /// Device identifier.
    pub id: String,
    /// Position of the device on its node.
    pub index: u32,
    /// Containers currently sharing the device.
    pub used: i32,
    /// Maximum number of sharing containers.
    pub count: i32,
    /// Memory already allocated, in MiB.
    pub usedmem: i32,
    /// Total memory, in MiB.
    pub totalmem: i32,
    /// Total compute cores.
    pub totalcore: i32,
    /// Compute cores already allocated.
    pub usedcores: i32,
    /// NUMA node.
    pub numa: i32,
    /// Advertised model string.
    pub device_type: String,
    /// Device health.
    pub health: bool,
}

impl From<&DeviceInfo> for DeviceUsage {
    fn from(info: &DeviceInfo) -> Self {
        Self {
            id: info.id.clone(),
            count: info.count,
            totalmem: info.devmem,
            totalcore: info.devcore,
            numa: info.numa,
            device_type: info.device_type.clone(),
            health: info.health,
            ..Default::default()
        }
    }
}

/// What a single container asks of one device family.
///
/// The `Default` value is the "no request" record: a container that does
/// not use this family produces it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerDeviceRequest {
    /// Number of devices requested.
    pub nums: i32,
    /// Device family, e.g. `"DCU"`.
    pub device_type: String,
    /// Absolute memory request, in the unit of the memory resource.
    pub memreq: i32,
    /// Memory request as a percentage of device capacity.
    ///
    /// Only meaningful when `memreq` is zero.
    pub mem_percentagereq: i32,
    /// Requested compute cores.
    pub coresreq: i32,
}

impl ContainerDeviceRequest {
    /// Returns `true` for the "no request" record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A device slice assigned to one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDevice {
    /// Position of the device on its node. Not part of the wire format.
    pub idx: u32,
    /// Device identifier.
    pub uuid: String,
    /// Device family or model string.
    pub device_type: String,
    /// Memory assigned, in MiB.
    pub usedmem: i32,
    /// Cores assigned.
    pub usedcores: i32,
}

/// Devices assigned to one container.
pub type ContainerDevices = Vec<ContainerDevice>;

/// Devices of one family assigned to a pod, one entry per container.
pub type PodSingleDevice = Vec<ContainerDevices>;

/// Devices assigned to a pod, keyed by device family.
pub type PodDevices = HashMap<String, PodSingleDevice>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_request_is_empty() {
        assert!(ContainerDeviceRequest::default().is_empty());

        let req = ContainerDeviceRequest {
            nums: 0,
            device_type: "DCU".to_string(),
            mem_percentagereq: 100,
            ..Default::default()
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn usage_from_info_copies_capacity() {
        let info = DeviceInfo {
            id: "dcu-0".to_string(),
            count: 10,
            devmem: 65536,
            devcore: 100,
            device_type: "DCU-K100".to_string(),
            numa: 1,
            health: true,
        };

        let usage = DeviceUsage::from(&info);
        assert_eq!(usage.id, "dcu-0");
        assert_eq!(usage.totalmem, 65536);
        assert_eq!(usage.totalcore, 100);
        assert_eq!(usage.used, 0);
        assert_eq!(usage.usedmem, 0);
        assert_eq!(usage.device_type, "DCU-K100");
        assert!(usage.health);
    }

    #[test]
    fn request_serializes_with_field_names() {
        let req = ContainerDeviceRequest {
            nums: 2,
            device_type: "DCU".to_string(),
            memreq: 0,
            mem_percentagereq: 100,
            coresreq: 10,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["nums"], 2);
        assert_eq!(json["device_type"], "DCU");
        assert_eq!(json["mem_percentagereq"], 100);

        let back: ContainerDeviceRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, req);
    }
}
