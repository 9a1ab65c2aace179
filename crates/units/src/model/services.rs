//! Access lists, QoS, SNMP, ethernet OAM and IPsec client data.

use serde::{Deserialize, Serialize};

// ============================================================================
// ACL
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclType {
    #[default]
    AclIpv4,
    AclIpv6,
}

impl AclType {
    /// Type from the address family keyword printed by devices.
    #[must_use]
    pub fn from_family(family: &str) -> Option<Self> {
        match family.to_ascii_lowercase().as_str() {
            "ipv4" | "ip" => Some(Self::AclIpv4),
            "ipv6" => Some(Self::AclIpv6),
            _ => None,
        }
    }
}

/// Member of an ACL set list (`/acl/acl-sets/acl-set` or an interface binding).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AclSet {
    pub set_name: String,
}

/// `.../acl-set[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AclSetConfig {
    pub set_name: String,
    #[serde(rename = "type")]
    pub kind: AclType,
}

/// Member of `/acl/interfaces/interface`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AclInterface {
    pub id: String,
}

// ============================================================================
// QoS
// ============================================================================

/// Member of `/qos/classifiers/classifier`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Classifier {
    pub name: String,
}

/// Member of `/qos/classifiers/classifier[name]/terms/term`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Term {
    pub id: String,
}

/// Member of `/qos/scheduler-policies/scheduler-policy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulerPolicy {
    pub name: String,
}

/// What a SAOS scheduler policy is backed by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerType {
    /// A traffic profile on a port
    #[default]
    PortPolicy,
    /// An egress port queue group, named after its port
    ServicePolicy,
}

/// `.../scheduler-policy[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchedulerPolicyConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SchedulerType,
    /// Port the profile is attached to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_id: Option<String>,
    /// Virtual switch the profile is scoped to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vs_name: Option<String>,
    /// Committed information rate in kbps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cir: Option<u64>,
}

// ============================================================================
// SNMP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrapEvent {
    Linkupdown,
    Other,
}

/// `/snmp/interfaces/interface[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SnmpInterfaceConfig {
    pub interface_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enabled_trap_for_event: Vec<TrapEvent>,
}

// ============================================================================
// Ethernet OAM
// ============================================================================

/// `/oam/cfm/domains/domain[name]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CfmDomainConfig {
    pub domain_name: String,
    pub level: u8,
}

/// `/oam/cfm/domains/domain[name]/mas/ma[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CfmMaConfig {
    pub ma_name: String,
}

// ============================================================================
// IPsec
// ============================================================================

/// `/ipsec/client-groups/client-group[name]/clients/client[id]/config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IpsecClientConfig {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
