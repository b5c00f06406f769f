//! Device adapters for heterogeneous accelerator scheduling on Kubernetes.
//!
//! This crate provides the [`Devices`] trait, the capability contract a
//! scheduler and admission webhook use to handle one vendor's device
//! family, and the Hygon DCU implementation [`DcuDevices`]. It handles:
//!
//! - Admission gating on the family's count resource
//! - Decoding node inventories from registration annotations
//! - Matching requests to card models with include/exclude filters
//! - Deriving per-container device requests from resource quantities
//! - Writing assigned devices back into pod annotations
//! - Handshake health checks and node cleanup
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Scheduler / Admission Webhook                   │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        DeviceTable                              │
//! │   family ──► Arc<dyn Devices>      Arc<AnnotationRegistry>      │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        DcuDevices                               │
//! │  ┌──────────────┐ ┌──────────────┐ ┌─────────────────────────┐  │
//! │  │ Type filter  │ │   Request    │ │ Node inventory / patch  │  │
//! │  │              │ │  extraction  │ │                         │  │
//! │  └──────────────┘ └──────────────┘ └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            NodeAnnotator (Kubernetes API server)                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use accel_sched_device::check_dcu_type;
//! use accel_sched_device::dcu::{DCU_IN_USE, DCU_NO_USE};
//!
//! let mut annotations = BTreeMap::new();
//! annotations.insert(DCU_NO_USE.to_string(), "K100".to_string());
//! assert!(check_dcu_type(&annotations, "K200-PRO"));
//!
//! // An inclusion list decides on its own.
//! annotations.insert(DCU_IN_USE.to_string(), "K100,K200".to_string());
//! assert!(check_dcu_type(&annotations, "k100-pro"));
//! assert!(!check_dcu_type(&annotations, "Z100"));
//! ```
//!
//! # Testing
//!
//! Enable the `test-utils` feature for [`MockNodeAnnotator`], which records
//! node patches in memory instead of calling the API server:
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use accel_sched_device::{DeviceConfig, DeviceTable, MockNodeAnnotator};
//! use k8s_openapi::api::core::v1::{Container, ResourceRequirements};
//! use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
//!
//! let table = DeviceTable::init(&DeviceConfig::default(), Arc::new(MockNodeAnnotator::new()))?;
//!
//! let container = Container {
//!     name: "train".to_string(),
//!     resources: Some(ResourceRequirements {
//!         limits: Some([("hygon.com/dcunum".to_string(), Quantity("2".to_string()))].into()),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! };
//!
//! assert!(table.mutate_admission(&container));
//! let requests = table.generate_resource_requests(&container);
//! assert_eq!(requests["DCU"].nums, 2);
//! assert_eq!(requests["DCU"].mem_percentagereq, 100);
//! # Ok::<(), accel_sched_device::DeviceError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod dcu;
pub mod devices;
pub mod error;
pub mod node;
pub mod quantity;
pub mod table;

pub use config::{DcuConfig, DeviceConfig};
pub use dcu::{check_dcu_type, DcuDevices};
pub use devices::{Devices, TypeCheck};
pub use error::{DeviceError, Result};
pub use node::{check_health, mark_annotations_to_delete, KubeNodeAnnotator, NodeAnnotator};
pub use table::DeviceTable;

#[cfg(any(test, feature = "test-utils"))]
pub use node::mock::MockNodeAnnotator;
