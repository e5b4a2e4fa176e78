//! Device GUID lookup from `instruments -s devices` output.
//!
//! Lines look like:
//!
//! ```text
//! my-mac [3E7C1B2A-0000-5D3B-9E8F-0123456789AB]
//! iPhone 6 (9.3) [D6E2B5B5-31E8-4B3A-9A63-6B0C6A0A6F11]
//! iPhone 6 (10.0) [A1B2C3D4-1111-2222-3333-444455556666] (Simulator)
//! ```
//!
//! A host entry has no OS version and is returned as soon as it is seen.
//! For simulators the entry with the newest OS version wins.

use crate::error::{BuildError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

static DEVICE_RE: OnceLock<Regex> = OnceLock::new();
static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn device_re() -> &'static Regex {
    DEVICE_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9 -]+ ?(?:\(([0-9.]+)\))? \[([A-F0-9-]+)\]").unwrap()
    })
}

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(r"^([0-9]+)\.([0-9]+)(?:\.([0-9]+))?").unwrap())
}

/// `major.minor[.patch]`, with a missing patch read as `0`.
fn parse_os_version(text: &str) -> Option<(u32, u32, u32)> {
    let caps = version_re().captures(text)?;
    let major = caps[1].parse().ok()?;
    let minor = caps[2].parse().ok()?;
    let patch = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some((major, minor, patch))
}

/// Find the GUID for `device` in a device listing.
///
/// Matching on the name is a case-insensitive prefix match since host names
/// are not reported with consistent casing.
pub fn parse_device_list(output: &str, device: &str) -> Option<String> {
    let name_re = Regex::new(&format!("(?i)^{}", regex::escape(device))).ok()?;

    let mut latest: Option<((u32, u32, u32), String)> = None;
    for line in output.lines() {
        if !name_re.is_match(line) {
            continue;
        }
        // Simulator pairs with a watch do not match and are ignored.
        let Some(caps) = device_re().captures(line) else {
            continue;
        };
        let guid = caps[2].to_string();
        let Some(version) = caps.get(1) else {
            return Some(guid);
        };
        let Some(version) = parse_os_version(version.as_str()) else {
            continue;
        };
        if latest.as_ref().map_or(true, |(best, _)| version > *best) {
            latest = Some((version, guid));
        }
    }
    latest.map(|(_, guid)| guid)
}

// ---------------------------------------------------------------------------
// Listing source
// ---------------------------------------------------------------------------

/// Produces the raw device listing.
pub trait DeviceLister {
    fn list_devices(&mut self) -> Result<String>;
}

/// Runs `instruments -s devices`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstrumentsLister;

impl DeviceLister for InstrumentsLister {
    fn list_devices(&mut self) -> Result<String> {
        capture_stdout("instruments", &["-s", "devices"])
    }
}

/// Short host name (`hostname -s`), used to find the Mac's own entry.
pub fn short_hostname() -> Result<String> {
    Ok(capture_stdout("hostname", &["-s"])?.trim().to_string())
}

fn capture_stdout(program: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| BuildError::SpawnFailed {
            program: program.to_string(),
            source,
        })?;
    if !output.status.success() {
        tracing::debug!(
            program,
            status = ?output.status,
            "non-zero exit while listing; using stdout as-is"
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

// ---------------------------------------------------------------------------
// DeviceResolver
// ---------------------------------------------------------------------------

/// Resolves device names to GUIDs, remembering every answer for the life of
/// the resolver.
pub struct DeviceResolver<L: DeviceLister> {
    lister: L,
    cache: HashMap<String, Option<String>>,
}

impl<L: DeviceLister> DeviceResolver<L> {
    pub fn new(lister: L) -> Self {
        Self {
            lister,
            cache: HashMap::new(),
        }
    }

    /// GUID for `device`, or `None` if nothing in the listing matches.
    /// The lister runs at most once per device name.
    pub fn resolve(&mut self, device: &str) -> Result<Option<String>> {
        if let Some(hit) = self.cache.get(device) {
            tracing::debug!(device, "device guid cache hit");
            return Ok(hit.clone());
        }
        let listing = self.lister.list_devices()?;
        let guid = parse_device_list(&listing, device);
        self.cache.insert(device.to_string(), guid.clone());
        Ok(guid)
    }

    /// GUID of the Mac running this process.
    pub fn resolve_host(&mut self) -> Result<Option<String>> {
        let host = short_hostname()?;
        self.resolve(&host)
    }
}

impl DeviceResolver<InstrumentsLister> {
    pub fn instruments() -> Self {
        Self::new(InstrumentsLister)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
