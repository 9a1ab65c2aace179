//! Interface, subinterface and IPv4 address data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface type, keyed by the IANA `ifType` name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterfaceType {
    /// Physical ethernet port
    #[default]
    EthernetCsmacd,
    SoftwareLoopback,
    /// Link aggregation group
    Ieee8023adLag,
    /// VLAN subinterface
    L2vlan,
    /// MPLS traffic engineering tunnel
    Tunnel,
    Other,
}

impl InterfaceType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::EthernetCsmacd => "ethernetCsmacd",
            Self::SoftwareLoopback => "softwareLoopback",
            Self::Ieee8023adLag => "ieee8023adLag",
            Self::L2vlan => "l2vlan",
            Self::Tunnel => "tunnel",
            Self::Other => "other",
        }
    }

    /// Whether the interface exists in hardware and cannot be created or removed.
    #[must_use]
    pub fn is_physical(&self) -> bool {
        matches!(self, Self::EthernetCsmacd)
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Member of `/interface`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Interface {
    pub name: String,
}

/// `/interface[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InterfaceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InterfaceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Port attributes of switches that model ports beyond the base interface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<PortAttributes>,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, kind: InterfaceType) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }
}

/// Port-level attributes of carrier ethernet switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PortAttributes {
    /// Connector mode, e.g. `rj45`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptable_frame_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_ingress_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_ethertype_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_to_egress_qmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_dynamic_macs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_unlearned: Option<bool>,
}

/// Member of `/interface[name]/subinterfaces/subinterface`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Subinterface {
    pub index: u32,
}

/// `/interface[name]/aggregation/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AggregationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_links: Option<u16>,
}

/// Member of `.../ipv4/addresses/address`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Ipv4Address {
    pub ip: String,
}

/// `.../ipv4/addresses/address[ip]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Ipv4AddressConfig {
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u8>,
}

/// Interface name and subinterface index of an address path.
///
/// Index 0 addresses the interface itself.
#[must_use]
pub fn subinterface_name(interface: &str, index: u32) -> String {
    if index == 0 {
        interface.to_string()
    } else {
        format!("{interface}.{index}")
    }
}
