//! Node sequences handlers are registered against.
//!
//! Kept in one place so units of different devices register the same subtree
//! under the same pattern.

use translate::PathPattern;

pub const INTERFACE: &[&str] = &["interface"];
pub const INTERFACE_CONFIG: &[&str] = &["interface", "config"];
pub const SUBINTERFACE: &[&str] = &["interface", "subinterfaces", "subinterface"];
pub const AGGREGATION_CONFIG: &[&str] = &["interface", "aggregation", "config"];
pub const IPV4_ADDRESS: &[&str] = &[
    "interface",
    "subinterfaces",
    "subinterface",
    "ipv4",
    "addresses",
    "address",
];
pub const IPV4_ADDRESS_CONFIG: &[&str] = &[
    "interface",
    "subinterfaces",
    "subinterface",
    "ipv4",
    "addresses",
    "address",
    "config",
];
pub const ACL_INTERFACE: &[&str] = &["acl", "interfaces", "interface"];
pub const INGRESS_ACL_SET: &[&str] =
    &["acl", "interfaces", "interface", "ingress-acl-sets", "ingress-acl-set"];
pub const EGRESS_ACL_SET: &[&str] =
    &["acl", "interfaces", "interface", "egress-acl-sets", "egress-acl-set"];
pub const EGRESS_ACL_SET_CONFIG: &[&str] = &[
    "acl",
    "interfaces",
    "interface",
    "egress-acl-sets",
    "egress-acl-set",
    "config",
];
pub const ACL_SET: &[&str] = &["acl", "acl-sets", "acl-set"];
pub const ACL_SET_CONFIG: &[&str] = &["acl", "acl-sets", "acl-set", "config"];

pub const NETWORK_INSTANCE: &[&str] = &["network-instance"];
pub const NETWORK_INSTANCE_CONFIG: &[&str] = &["network-instance", "config"];
pub const CONNECTION_POINTS: &[&str] = &["network-instance", "connection-points"];
pub const CONNECTION_POINT: &[&str] =
    &["network-instance", "connection-points", "connection-point"];
pub const VLAN: &[&str] = &["network-instance", "vlans", "vlan"];
pub const VLAN_CONFIG: &[&str] = &["network-instance", "vlans", "vlan", "config"];
pub const INSTANCE_INTERFACE: &[&str] = &["network-instance", "interfaces", "interface"];
pub const INSTANCE_INTERFACE_CONFIG: &[&str] =
    &["network-instance", "interfaces", "interface", "config"];
pub const VLAN_VIRTUAL_RING: &[&str] =
    &["network-instance", "vlans", "vlan", "virtual-rings", "virtual-ring"];
pub const LOGICAL_RING_CONFIG: &[&str] = &["logical-rings", "virtual-ring", "config"];

pub const PROTOCOL: &[&str] = &["network-instance", "protocols", "protocol"];
pub const STATIC_ROUTE: &[&str] =
    &["network-instance", "protocols", "protocol", "static-routes", "static"];
pub const NEXT_HOP: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "static-routes",
    "static",
    "next-hops",
    "next-hop",
];
pub const NEXT_HOP_STATE: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "static-routes",
    "static",
    "next-hops",
    "next-hop",
    "state",
];
pub const OSPF_MAX_METRIC_CONFIG: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "ospfv2",
    "global",
    "timers",
    "max-metric",
    "config",
];
pub const OSPF_AREA: &[&str] =
    &["network-instance", "protocols", "protocol", "ospfv2", "areas", "area"];
pub const OSPF_AREA_INTERFACE: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "ospfv2",
    "areas",
    "area",
    "interfaces",
    "interface",
];
pub const OSPF_AREA_INTERFACE_CONFIG: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "ospfv2",
    "areas",
    "area",
    "interfaces",
    "interface",
    "config",
];
pub const LOCAL_AGGREGATE: &[&str] =
    &["network-instance", "protocols", "protocol", "local-aggregates", "aggregate"];
pub const LOCAL_AGGREGATE_CONFIG: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "local-aggregates",
    "aggregate",
    "config",
];
pub const BGP_GLOBAL_CONFIG: &[&str] =
    &["network-instance", "protocols", "protocol", "bgp", "global", "config"];
pub const BGP_AFI_SAFI_CONFIG: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "bgp",
    "global",
    "afi-safis",
    "afi-safi",
    "config",
];
pub const BGP_PEER_GROUP: &[&str] =
    &["network-instance", "protocols", "protocol", "bgp", "peer-groups", "peer-group"];
pub const BGP_PEER_GROUP_AFI_SAFI: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "bgp",
    "peer-groups",
    "peer-group",
    "afi-safis",
    "afi-safi",
];
pub const BGP_NEIGHBOR: &[&str] =
    &["network-instance", "protocols", "protocol", "bgp", "neighbors", "neighbor"];
pub const BGP_PREFIX_LIMIT_CONFIG: &[&str] = &[
    "network-instance",
    "protocols",
    "protocol",
    "bgp",
    "neighbors",
    "neighbor",
    "afi-safis",
    "afi-safi",
    "ipv4-unicast",
    "prefix-limit",
    "config",
];

pub const LDP_GLOBAL_CONFIG: &[&str] = &[
    "network-instance",
    "mpls",
    "signaling-protocols",
    "ldp",
    "global",
    "config",
];
pub const LDP_INTERFACE_CONFIG: &[&str] = &[
    "network-instance",
    "mpls",
    "signaling-protocols",
    "ldp",
    "interface-attributes",
    "interfaces",
    "interface",
    "config",
];
pub const TE_TUNNEL: &[&str] = &["network-instance", "mpls", "lsps", "constrained-path", "tunnel"];
pub const TE_TUNNEL_CONFIG: &[&str] =
    &["network-instance", "mpls", "lsps", "constrained-path", "tunnel", "config"];
pub const RSVP_INTERFACE: &[&str] = &[
    "network-instance",
    "mpls",
    "signaling-protocols",
    "rsvp-te",
    "interface-attributes",
    "interface",
];

pub const QOS_CLASSIFIER: &[&str] = &["qos", "classifiers", "classifier"];
pub const QOS_TERM: &[&str] = &["qos", "classifiers", "classifier", "terms", "term"];
pub const SCHEDULER_POLICY: &[&str] = &["qos", "scheduler-policies", "scheduler-policy"];
pub const SCHEDULER_POLICY_CONFIG: &[&str] =
    &["qos", "scheduler-policies", "scheduler-policy", "config"];
pub const SNMP_INTERFACE_CONFIG: &[&str] = &["snmp", "interfaces", "interface", "config"];
pub const CFM_DOMAIN_CONFIG: &[&str] = &["oam", "cfm", "domains", "domain", "config"];
pub const CFM_MA_CONFIG: &[&str] = &["oam", "cfm", "domains", "domain", "mas", "ma", "config"];
pub const IPSEC_CLIENT_CONFIG: &[&str] = &[
    "ipsec",
    "client-groups",
    "client-group",
    "clients",
    "client",
    "config",
];

/// Pattern for a node sequence.
#[must_use]
pub fn pattern(nodes: &[&str]) -> PathPattern {
    PathPattern::new(nodes)
}
