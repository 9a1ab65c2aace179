//! # Units
//!
//! Device units: the readers and writers that translate between the
//! vendor-neutral configuration model and one network operating system's CLI.
//!
//! ## Core Concepts
//!
//! - **Device**: a supported CLI dialect (`ios`, `ios-xr`, `vrp`, ...)
//! - **Unit**: registers a device's handlers into a [`RegistryBuilder`]
//! - **Model**: typed configuration data shared across devices ([`model`])
//!
//! ## Example
//!
//! ```ignore
//! use translate::{ConfigPath, MockChannel, Transaction};
//! use units::Device;
//!
//! let registry = units::registry_for(Device::Ios)?;
//! let channel = MockChannel::new()
//!     .with_output("show running-config | include ^ip vrf", "ip vrf TEST\n");
//! let tx = Transaction::new(&registry, &channel);
//! let keys = tx.read_keys(&"/network-instance".parse()?)?;
//! assert_eq!(keys, ["TEST", "default"]);
//! ```
//!
//! ## Supported Devices
//!
//! | Device    | Dialect                   |
//! |-----------|---------------------------|
//! | `ios`     | Cisco IOS                 |
//! | `ios-xr`  | Cisco IOS XR              |
//! | `vrp`     | Huawei VRP                |
//! | `ironware`| Brocade IronWare          |
//! | `saos`    | Ciena SAOS                |
//! | `sros`    | Nokia SR OS               |
//! | `dasan`   | Dasan NOS                 |
//! | `cubro`   | Cubro packet broker       |

pub mod brocade;
pub mod common;
pub mod cubro;
pub mod dasan;
pub mod huawei;
pub mod ios;
pub mod model;
pub mod paths;
pub mod saos;
pub mod sros;
pub mod xr;

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use translate::{Registry, RegistryBuilder};

/// Result type alias for unit lookup.
pub type Result<T> = std::result::Result<T, UnitError>;

/// Errors raised while selecting and wiring a device unit.
#[derive(Debug, thiserror::Error)]
pub enum UnitError {
    #[error(
        "unknown device type '{0}' (supported: {supported})",
        supported = Device::names().join(", ")
    )]
    UnknownDevice(String),

    #[error("invalid error pattern '{pattern}' for {device}")]
    InvalidPattern {
        device: Device,
        pattern: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("registry for {device} is inconsistent")]
    Registry {
        device: Device,
        #[source]
        source: translate::Error,
    },
}

// ============================================================================
// Device
// ============================================================================

/// A supported CLI dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Ios,
    IosXr,
    Huawei,
    Brocade,
    Saos,
    Saos8,
    Sros,
    Dasan,
    Cubro,
}

impl Device {
    /// Identifier used on the command line and in configuration files.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::IosXr => "ios-xr",
            Self::Huawei => "vrp",
            Self::Brocade => "ironware",
            Self::Saos => "saos",
            Self::Saos8 => "saos8",
            Self::Sros => "sros",
            Self::Dasan => "dasan",
            Self::Cubro => "cubro",
        }
    }

    #[must_use]
    pub fn all() -> &'static [Self] {
        &[
            Self::Ios,
            Self::IosXr,
            Self::Huawei,
            Self::Brocade,
            Self::Saos,
            Self::Saos8,
            Self::Sros,
            Self::Dasan,
            Self::Cubro,
        ]
    }

    fn names() -> Vec<&'static str> {
        Self::all().iter().map(Self::name).collect()
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Device {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        let device = match s.to_ascii_lowercase().as_str() {
            "ios" => Self::Ios,
            "ios-xr" | "xr" => Self::IosXr,
            "vrp" | "huawei" => Self::Huawei,
            "ironware" | "brocade" => Self::Brocade,
            "saos" | "ciena" => Self::Saos,
            "saos8" | "saos-8" => Self::Saos8,
            "sros" | "nokia" => Self::Sros,
            "dasan" => Self::Dasan,
            "cubro" => Self::Cubro,
            _ => return Err(UnitError::UnknownDevice(s.to_string())),
        };
        Ok(device)
    }
}

// ============================================================================
// Unit
// ============================================================================

/// Handler set of one device type.
pub trait Unit: Send + Sync {
    /// The device this unit translates for.
    fn device(&self) -> Device;

    /// Register every reader and writer of the unit.
    fn register(&self, builder: &mut RegistryBuilder);

    /// Patterns that mark a write as rejected when found in device output.
    ///
    /// Patterns are compiled in multi-line mode, so `^` anchors at any line.
    fn error_patterns(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Every unit, one per device.
#[must_use]
pub fn all() -> Vec<Box<dyn Unit>> {
    Device::all().iter().map(|d| unit_for(*d)).collect()
}

/// The unit for `device`.
#[must_use]
pub fn unit_for(device: Device) -> Box<dyn Unit> {
    match device {
        Device::Ios => Box::new(ios::IosUnit),
        Device::IosXr => Box::new(xr::XrUnit),
        Device::Huawei => Box::new(huawei::VrpUnit),
        Device::Brocade => Box::new(brocade::IronwareUnit),
        Device::Saos => Box::new(saos::SaosUnit),
        Device::Saos8 => Box::new(saos::Saos8Unit),
        Device::Sros => Box::new(sros::SrosUnit),
        Device::Dasan => Box::new(dasan::DasanUnit),
        Device::Cubro => Box::new(cubro::CubroUnit),
    }
}

/// Build the handler registry for `device`.
///
/// # Errors
///
/// Fails when the unit's registrations are inconsistent (duplicate patterns
/// or a writer ordering cycle).
pub fn registry_for(device: Device) -> Result<Registry> {
    let unit = unit_for(device);
    let mut builder = Registry::builder();
    unit.register(&mut builder);
    let registry = builder
        .build()
        .map_err(|source| UnitError::Registry { device, source })?;
    log::debug!("built {device} registry: {registry:?}");
    Ok(registry)
}

/// Compiled rejection patterns of the unit for `device`.
///
/// # Errors
///
/// Fails when a pattern does not compile.
pub fn error_patterns(device: Device) -> Result<Vec<Regex>> {
    unit_for(device)
        .error_patterns()
        .iter()
        .map(|pattern| {
            Regex::new(&format!("(?m){pattern}")).map_err(|source| UnitError::InvalidPattern {
                device,
                pattern,
                source,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_names_roundtrip() {
        for device in Device::all() {
            assert_eq!(device.name().parse::<Device>().unwrap(), *device);
        }
        assert_eq!("XR".parse::<Device>().unwrap(), Device::IosXr);
    }

    #[test]
    fn test_unknown_device() {
        let err = "junos".parse::<Device>().unwrap_err();
        assert!(err.to_string().contains("junos"));
        assert!(err.to_string().contains("ios-xr"));
    }

    #[test]
    fn test_every_registry_builds() {
        for device in Device::all() {
            let registry = registry_for(*device).unwrap();
            assert!(
                !registry.reader_patterns().is_empty() || !registry.write_order().is_empty(),
                "{device} registers nothing"
            );
        }
    }

    #[test]
    fn test_every_error_pattern_compiles() {
        for device in Device::all() {
            error_patterns(*device).unwrap();
        }
    }

    #[test]
    fn test_all_covers_every_device() {
        let devices: Vec<_> = all().iter().map(|u| u.device()).collect();
        assert_eq!(devices, Device::all());
    }
}
