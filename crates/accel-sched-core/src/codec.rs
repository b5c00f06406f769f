//! Annotation wire format for node inventories and pod assignments.
//!
//! Node registration annotations hold one record per device, each record
//! terminated by `:` and made of seven comma-separated fields:
//!
//! ```text
//! id,count,devmem,devcore,type,numa,health:
//! ```
//!
//! Pod assignment annotations hold one group per container, each group
//! terminated by `;`, and one `uuid,type,usedmem,usedcores:` record per
//! assigned device inside a group.
//!
//! Numeric fields that fail to parse decode as zero; only structural
//! problems (missing delimiters, wrong field counts) are errors.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::CodecError;
use crate::registry::AnnotationRegistry;
use crate::types::{ContainerDevice, ContainerDevices, DeviceInfo, PodDevices, PodSingleDevice};

const RECORD_SEP: char = ':';
const FIELD_SEP: char = ',';
const CONTAINER_SEP: char = ';';

const NODE_DEVICE_FIELDS: usize = 7;
const CONTAINER_DEVICE_FIELDS: usize = 4;

/// Encode a node inventory for the registration annotation.
#[must_use]
pub fn encode_node_devices(devices: &[DeviceInfo]) -> String {
    let mut out = String::new();
    for d in devices {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "{},{},{},{},{},{},{}{RECORD_SEP}",
            d.id, d.count, d.devmem, d.devcore, d.device_type, d.numa, d.health
        );
    }
    out
}

/// Decode a node registration annotation.
///
/// Segments without a field separator are skipped, so the trailing empty
/// segment after the last `:` is harmless.
///
/// # Errors
///
/// Returns [`CodecError::MissingDelimiter`] if the payload has no `:` at all
/// and [`CodecError::FieldCount`] if any record does not have seven fields.
pub fn decode_node_devices(encoded: &str) -> Result<Vec<DeviceInfo>, CodecError> {
    if !encoded.contains(RECORD_SEP) {
        return Err(CodecError::MissingDelimiter(RECORD_SEP));
    }

    let mut devices = Vec::new();
    for segment in encoded.split(RECORD_SEP) {
        if !segment.contains(FIELD_SEP) {
            continue;
        }
        let fields: Vec<&str> = segment.split(FIELD_SEP).collect();
        if fields.len() != NODE_DEVICE_FIELDS {
            return Err(CodecError::FieldCount {
                expected: NODE_DEVICE_FIELDS,
                got: fields.len(),
                segment: segment.to_string(),
            });
        }
        devices.push(DeviceInfo {
            id: fields[0].to_string(),
            count: parse_i32(fields[1]),
            devmem: parse_i32(fields[2]),
            devcore: parse_i32(fields[3]),
            device_type: fields[4].to_string(),
            numa: parse_i32(fields[5]),
            health: parse_bool(fields[6]),
        });
    }
    Ok(devices)
}

/// Encode the devices assigned to one container.
#[must_use]
pub fn encode_container_devices(devices: &[ContainerDevice]) -> String {
    let mut out = String::new();
    for d in devices {
        let _ = write!(
            out,
            "{},{},{},{}{RECORD_SEP}",
            d.uuid, d.device_type, d.usedmem, d.usedcores
        );
    }
    out
}

/// Encode the devices of one family assigned to a pod.
#[must_use]
pub fn encode_pod_single_device(pod: &[ContainerDevices]) -> String {
    let mut out = String::new();
    for container in pod {
        out.push_str(&encode_container_devices(container));
        out.push(CONTAINER_SEP);
    }
    out
}

/// Decode the devices assigned to one container.
///
/// # Errors
///
/// Returns [`CodecError::FieldCount`] if a record has fewer than four fields.
pub fn decode_container_devices(encoded: &str) -> Result<ContainerDevices, CodecError> {
    let mut devices = ContainerDevices::new();
    for segment in encoded.split(RECORD_SEP) {
        if !segment.contains(FIELD_SEP) {
            continue;
        }
        let fields: Vec<&str> = segment.split(FIELD_SEP).collect();
        if fields.len() < CONTAINER_DEVICE_FIELDS {
            return Err(CodecError::FieldCount {
                expected: CONTAINER_DEVICE_FIELDS,
                got: fields.len(),
                segment: segment.to_string(),
            });
        }
        devices.push(ContainerDevice {
            idx: 0,
            uuid: fields[0].to_string(),
            device_type: fields[1].to_string(),
            usedmem: parse_i32(fields[2]),
            usedcores: parse_i32(fields[3]),
        });
    }
    Ok(devices)
}

/// Decode the devices of one family assigned to a pod.
///
/// Container groups keep their position; only the empty segment after the
/// final `;` is dropped.
///
/// # Errors
///
/// Propagates any container decoding error.
pub fn decode_pod_single_device(encoded: &str) -> Result<PodSingleDevice, CodecError> {
    if encoded.is_empty() {
        return Ok(PodSingleDevice::new());
    }
    let body = encoded.strip_suffix(CONTAINER_SEP).unwrap_or(encoded);
    body.split(CONTAINER_SEP)
        .map(decode_container_devices)
        .collect()
}

/// Decode every registered family's allocation annotation on a pod.
///
/// Families whose "allocated" key is absent from `annotations` are left out
/// of the result.
///
/// # Errors
///
/// Propagates the first decoding error.
pub fn decode_pod_devices(
    registry: &AnnotationRegistry,
    annotations: &BTreeMap<String, String>,
) -> Result<PodDevices, CodecError> {
    let mut pod_devices = PodDevices::new();
    for (family, keys) in registry.iter() {
        let Some(encoded) = annotations.get(&keys.supported) else {
            continue;
        };
        pod_devices.insert(family.to_string(), decode_pod_single_device(encoded)?);
    }
    Ok(pod_devices)
}

fn parse_i32(field: &str) -> i32 {
    field.parse().unwrap_or(0)
}

fn parse_bool(field: &str) -> bool {
    matches!(field, "1" | "t" | "T" | "true" | "TRUE" | "True")
}
