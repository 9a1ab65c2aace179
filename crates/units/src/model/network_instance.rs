//! Network instances: VRFs, pseudowires, VPLS domains and the default instance.

use super::InterfaceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the always-present global routing instance.
pub const DEFAULT_NETWORK: &str = "default";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceType {
    #[default]
    DefaultInstance,
    L3vrf,
    /// Point-to-point pseudowire
    L2p2p,
    /// Multipoint layer 2 domain
    L2vsi,
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DefaultInstance => "DEFAULT_INSTANCE",
            Self::L3vrf => "L3VRF",
            Self::L2p2p => "L2P2P",
            Self::L2vsi => "L2VSI",
        };
        write!(f, "{name}")
    }
}

/// Member of `/network-instance`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NetworkInstance {
    pub name: String,
}

/// `/network-instance[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NetworkInstanceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: InstanceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

impl NetworkInstanceConfig {
    pub fn new(name: impl Into<String>, kind: InstanceType) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }
}

/// One side of a layer 2 connection point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Endpoint {
    Local {
        interface: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vlan: Option<u16>,
    },
    Remote {
        address: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vc_id: Option<u32>,
    },
}

/// Member of `/network-instance[name]/connection-points/connection-point`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectionPoint {
    pub connection_point_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

impl ConnectionPoint {
    /// Circuit id of the first remote endpoint.
    #[must_use]
    pub fn vc_id(&self) -> Option<u32> {
        self.endpoints.iter().find_map(|e| match e {
            Endpoint::Remote { vc_id, .. } => *vc_id,
            Endpoint::Local { .. } => None,
        })
    }
}

/// `/network-instance[name]/connection-points` as written by a transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConnectionPoints {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connection_point: Vec<ConnectionPoint>,
}

impl ConnectionPoints {
    #[must_use]
    pub fn vc_id(&self) -> Option<u32> {
        self.connection_point.iter().find_map(ConnectionPoint::vc_id)
    }
}

/// Member of `/network-instance[name]/vlans/vlan`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Vlan {
    pub vlan_id: u16,
}

/// `/network-instance[name]/vlans/vlan[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VlanConfig {
    pub vlan_id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Member of `/network-instance[name]/interfaces/interface`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceInterface {
    pub id: String,
}

/// `/network-instance[name]/interfaces/interface[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceInterfaceConfig {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Kind of port attached to the instance
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<InterfaceType>,
}

/// Member of `.../vlan[id]/virtual-rings/virtual-ring` and `/logical-ring`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VirtualRing {
    pub name: String,
}
