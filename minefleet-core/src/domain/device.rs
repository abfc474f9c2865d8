//! Device domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Compute backend a device was discovered through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceBackend {
    Cuda,
    OpenCl,
}

impl std::fmt::Display for DeviceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceBackend::Cuda => write!(f, "CUDA"),
            DeviceBackend::OpenCl => write!(f, "OpenCL"),
        }
    }
}

/// An accelerator device
///
/// Immutable after discovery. Each descriptor is owned by exactly one
/// worker slot for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Device index passed to the compute executable (`-g`)
    pub device_id: u32,
    /// Platform index passed to the compute executable (`-p`)
    pub platform_id: u32,
    /// Human readable model name
    pub model: String,
    /// Path of the compute executable serving this device
    pub executable_path: PathBuf,
    pub backend: DeviceBackend,
}
