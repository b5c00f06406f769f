//! Core types and utilities for accel-sched.
//!
//! This crate provides the pieces every device adapter shares:
//!
//! - **Device types**: node inventories, per-container requests and pod
//!   assignment maps
//! - **Codec**: the annotation wire format for node and pod annotations
//! - **Registry**: per-family annotation keys, written once at startup
//! - **Error types**: codec and registry errors
//!
//! # Example
//!
//! ```
//! use accel_sched_core::{decode_node_devices, encode_node_devices};
//!
//! let devices = decode_node_devices("dcu-0,4,65536,100,DCU-K100,0,true:").unwrap();
//! assert_eq!(devices[0].device_type, "DCU-K100");
//! assert_eq!(encode_node_devices(&devices), "dcu-0,4,65536,100,DCU-K100,0,true:");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod error;
pub mod registry;
pub mod types;

pub use codec::{
    decode_container_devices, decode_node_devices, decode_pod_devices, decode_pod_single_device,
    encode_container_devices, encode_node_devices, encode_pod_single_device,
};
pub use error::{CodecError, CoreError, Result};
pub use registry::{AnnotationRegistry, DeviceAnnotationKeys};
pub use types::{
    ContainerDevice, ContainerDeviceRequest, ContainerDevices, DeviceInfo, DeviceUsage,
    PodDevices, PodSingleDevice,
};
