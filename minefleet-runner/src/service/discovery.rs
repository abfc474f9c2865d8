//! Device discovery
//!
//! The compute executables print the devices they can see when started
//! without arguments. Discovery runs each one once at startup and scrapes
//! the bracketed device entries from its diagnostic stream:
//!
//! ```text
//! [ 1][t 0][...] [ GPU #0: SM 8.6 NVIDIA GeForce RTX 3070 ]
//! [ 1][t 0][...] [ OpenCL: platform #0 device #1 gfx1030 ]
//! ```

use anyhow::{Result, bail};
use async_trait::async_trait;
use minefleet_core::domain::device::{DeviceBackend, DeviceDescriptor};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Integrated AMD graphics codenames that are not worth mining on
const AMD_APU_CODENAMES: [&str; 15] = [
    "gfx700", "gfx703", "gfx705", "gfx801", "gfx810", "gfx902", "gfx909", "gfx90c", "gfx1013",
    "gfx1033", "gfx1035", "gfx1036", "gfx1103", "gfx1150", "gfx1151",
];

static DEVICE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\[\]]*#\d+[^\[\]]*)\]").expect("device entry pattern is valid")
});

static ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d+)").expect("ordinal pattern is valid"));

static SM_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(SM \d\.\d )?").expect("SM prefix pattern is valid"));

/// Service trait for enumerating the accelerator devices to supervise
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Runs once at startup; an empty list is the caller's to treat as fatal
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>>;
}

/// Discovers devices by running the compute executables
pub struct MinerDiscovery {
    cuda: Option<PathBuf>,
    opencl: Option<PathBuf>,
}

impl MinerDiscovery {
    pub fn new(cuda: Option<PathBuf>, opencl: Option<PathBuf>) -> Self {
        Self { cuda, opencl }
    }
}

#[async_trait]
impl DeviceDiscovery for MinerDiscovery {
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut cuda = Vec::new();
        if let Some(path) = &self.cuda {
            if let Some(output) = query_devices(path).await {
                debug!("CUDA info: {}", output);
                cuda = parse_cuda_devices(&output, path);
            }
        }

        let mut opencl = Vec::new();
        if let Some(path) = &self.opencl {
            if let Some(output) = query_devices(path).await {
                debug!("OpenCL info: {}", output);
                opencl = parse_opencl_devices(&output, path);
            }
        }

        let devices = merge_devices(cuda, opencl);
        if devices.is_empty() {
            bail!("No usable devices found");
        }
        Ok(devices)
    }
}

/// Runs an executable without arguments and returns its diagnostic stream
async fn query_devices(path: &Path) -> Option<String> {
    let output = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match output {
        Ok(output) => Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        Err(e) => {
            warn!("Could not run {}: {}", path.display(), e);
            None
        }
    }
}

/// Splits one device entry into its `#N` ordinals and model name
fn parse_entry(entry: &str) -> Option<(Vec<u32>, String)> {
    let ids: Vec<u32> = ORDINAL
        .captures_iter(entry)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();

    let last = ORDINAL.find_iter(entry).last()?;
    let model = entry[last.end()..]
        .trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .trim()
        .to_string();

    if model.is_empty() {
        return None;
    }
    Some((ids, model))
}

fn is_integrated(model: &str) -> bool {
    let model = model.to_lowercase();
    model.contains("intel") || AMD_APU_CODENAMES.iter().any(|apu| model.contains(apu))
}

fn device_entries(output: &str) -> impl Iterator<Item = &str> {
    DEVICE_ENTRY
        .captures_iter(output)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// CUDA devices: platform 0, device id from the first `#N`
pub fn parse_cuda_devices(output: &str, executable: &Path) -> Vec<DeviceDescriptor> {
    let mut devices = Vec::new();
    for entry in device_entries(output) {
        let Some((ids, model)) = parse_entry(entry) else {
            warn!("Unrecognized CUDA device entry: {}", entry);
            continue;
        };
        if model.to_lowercase().contains("intel") {
            continue;
        }
        let Some(&device_id) = ids.first() else {
            warn!("CUDA device entry lacks a device id: {}", entry);
            continue;
        };

        devices.push(DeviceDescriptor {
            device_id,
            platform_id: 0,
            model,
            executable_path: executable.to_path_buf(),
            backend: DeviceBackend::Cuda,
        });
    }
    devices
}

/// OpenCL devices: platform and device ids from the first two `#N`
pub fn parse_opencl_devices(output: &str, executable: &Path) -> Vec<DeviceDescriptor> {
    let mut devices = Vec::new();
    for entry in device_entries(output) {
        let Some((ids, model)) = parse_entry(entry) else {
            warn!("Unrecognized OpenCL device entry: {}", entry);
            continue;
        };
        if is_integrated(&model) {
            continue;
        }
        if ids.len() < 2 {
            warn!("OpenCL device entry lacks platform and device ids: {}", entry);
            continue;
        }

        devices.push(DeviceDescriptor {
            device_id: ids[1],
            platform_id: ids[0],
            model,
            executable_path: executable.to_path_buf(),
            backend: DeviceBackend::OpenCl,
        });
    }
    devices
}

/// CUDA devices first, then OpenCL devices whose model CUDA did not cover
pub fn merge_devices(
    cuda: Vec<DeviceDescriptor>,
    opencl: Vec<DeviceDescriptor>,
) -> Vec<DeviceDescriptor> {
    let cuda_models: Vec<String> = cuda
        .iter()
        .map(|device| SM_PREFIX.replace(&device.model, "").into_owned())
        .collect();

    let mut devices = cuda;
    devices.extend(
        opencl
            .into_iter()
            .filter(|device| !cuda_models.contains(&device.model)),
    );
    devices
}

/// Logs the device list grouped by model
pub fn log_device_summary(devices: &[DeviceDescriptor]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for device in devices {
        *counts.entry(device.model.as_str()).or_default() += 1;
    }

    info!("Found {} device(s):", devices.len());
    for (model, count) in counts {
        info!("  x{} {}", count, model);
    }
}
