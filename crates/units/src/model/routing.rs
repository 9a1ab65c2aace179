//! Routing protocols, static routes and MPLS signaling.
//!
//! Protocol list keys combine the protocol identifier and the instance name
//! (`ospf 1`, `bgp default`, `static default`).

use serde::{Deserialize, Serialize};

pub const OSPF: &str = "ospf";
pub const BGP: &str = "bgp";
pub const STATIC: &str = "static";

/// Key of a `/network-instance[ni]/protocols/protocol` member.
#[must_use]
pub fn protocol_key(identifier: &str, name: &str) -> String {
    format!("{identifier} {name}")
}

/// Split a protocol key into identifier and instance name.
#[must_use]
pub fn split_protocol_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(' ')
}

/// Member of `/network-instance[ni]/protocols/protocol`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Protocol {
    pub identifier: String,
    pub name: String,
}

// ============================================================================
// OSPF
// ============================================================================

/// Optional LSA types advertised with maximum metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaxMetricInclude {
    #[serde(rename = "include-stub")]
    IncludeStub,
    #[serde(rename = "summary-lsa")]
    SummaryLsa,
    #[serde(rename = "external-lsa")]
    IncludeType2External,
}

impl MaxMetricInclude {
    /// Keyword as printed and accepted by the device.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::IncludeStub => "include-stub",
            Self::SummaryLsa => "summary-lsa",
            Self::IncludeType2External => "external-lsa",
        }
    }

    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "include-stub" => Some(Self::IncludeStub),
            "summary-lsa" => Some(Self::SummaryLsa),
            "external-lsa" => Some(Self::IncludeType2External),
            _ => None,
        }
    }
}

/// `.../ospfv2/global/timers/max-metric/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MaxMetricConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<bool>,
    /// Seconds after startup during which maximum metric is advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<MaxMetricInclude>,
}

/// Member of `.../ospfv2/areas/area`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OspfArea {
    pub identifier: String,
}

/// Member of `.../areas/area[id]/interfaces/interface`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AreaInterface {
    pub id: String,
}

/// `.../ospfv2/areas/area[id]/interfaces/interface[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AreaInterfaceConfig {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
}

// ============================================================================
// BGP
// ============================================================================

/// `.../bgp/global/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BgpGlobalConfig {
    #[serde(rename = "as")]
    pub as_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
}

/// Member of `.../protocol[key]/local-aggregates/aggregate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Aggregate {
    pub prefix: String,
}

/// `.../local-aggregates/aggregate[prefix]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AggregateConfig {
    pub prefix: String,
    /// Route policy applied to the aggregate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_policy: Option<String>,
}

/// `.../bgp/global/afi-safis/afi-safi[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AfiSafiConfig {
    pub afi_safi_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// `.../afi-safi[name]/ipv4-unicast/prefix-limit/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PrefixLimitConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_prefixes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_threshold_pct: Option<u8>,
}

/// A whole `.../bgp/neighbors/neighbor[address]` subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BgpNeighbor {
    pub neighbor_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_as: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub afi_safis: Vec<String>,
}

/// Device keyword for an address family name (`ipv4-unicast` → `ipv4 unicast`).
#[must_use]
pub fn afi_safi_keyword(name: &str) -> String {
    match name {
        "l3vpn-ipv4-unicast" => "vpnv4 unicast".to_string(),
        "l3vpn-ipv6-unicast" => "vpnv6 unicast".to_string(),
        other => other.replacen('-', " ", 1),
    }
}

/// Address family name for a device keyword pair (`ipv4` → `ipv4-unicast`).
///
/// A missing SAFI means unicast.
#[must_use]
pub fn afi_safi_name(afi: &str, safi: Option<&str>) -> Option<String> {
    let safi = safi.unwrap_or("unicast");
    match afi {
        "vpnv4" | "vpnv6" if safi == "unicast" => Some(format!("l3vpn-ipv{}-unicast", &afi[4..])),
        "ipv4" | "ipv6" => Some(format!("{afi}-{safi}")),
        _ => None,
    }
}

/// Member of `.../bgp/peer-groups/peer-group`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PeerGroup {
    pub peer_group_name: String,
}

/// Member of an `afi-safis/afi-safi` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AfiSafi {
    pub afi_safi_name: String,
}

// ============================================================================
// Static routes
// ============================================================================

/// Member of `.../static-routes/static`, keyed by CIDR prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StaticRoute {
    pub prefix: String,
}

/// Member of `.../static[prefix]/next-hops/next-hop`.
///
/// The index is the outgoing interface and next-hop address joined by a
/// space, either of which may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NextHop {
    pub index: String,
}

/// `.../static[prefix]/next-hops/next-hop[index]/state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NextHopState {
    pub index: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
}

// ============================================================================
// MPLS
// ============================================================================

/// `/network-instance[ni]/mpls/signaling-protocols/ldp/global/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LdpGlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// `.../ldp/interface-attributes/interfaces/interface[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LdpInterfaceConfig {
    pub interface_id: String,
}

/// Member of `.../mpls/lsps/constrained-path/tunnel`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Tunnel {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    Absolute,
    Relative,
}

/// `.../constrained-path/tunnel[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TunnelConfig {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_eligible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<MetricType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_share: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

/// Member of `.../mpls/signaling-protocols/rsvp-te/interface-attributes/interface`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RsvpInterface {
    pub interface_id: String,
}
