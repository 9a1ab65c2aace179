//! Typed configuration data shared by all device units.
//!
//! Field names follow the kebab-case leaf names of the vendor-neutral model so
//! snapshots read from one device can be written to another.

pub mod interface;
pub mod network_instance;
pub mod routing;
pub mod services;

pub use interface::{
    AggregationConfig, Interface, InterfaceConfig, InterfaceType, Ipv4Address, Ipv4AddressConfig,
    PortAttributes, Subinterface,
};
pub use network_instance::{
    ConnectionPoint, ConnectionPoints, DEFAULT_NETWORK, Endpoint, InstanceInterface,
    InstanceInterfaceConfig, InstanceType, NetworkInstance, NetworkInstanceConfig, VirtualRing,
    Vlan, VlanConfig,
};
pub use routing::{
    AfiSafi, AfiSafiConfig, Aggregate, AggregateConfig, AreaInterface, AreaInterfaceConfig,
    BgpGlobalConfig, BgpNeighbor, LdpGlobalConfig, LdpInterfaceConfig, MaxMetricConfig,
    MaxMetricInclude, MetricType, NextHop, NextHopState, OspfArea, PeerGroup, PrefixLimitConfig,
    Protocol, RsvpInterface, StaticRoute, Tunnel, TunnelConfig,
};
pub use services::{
    AclInterface, AclSet, AclSetConfig, AclType, CfmDomainConfig, Classifier, CfmMaConfig,
    IpsecClientConfig, SchedulerPolicy, SchedulerPolicyConfig, SchedulerType, SnmpInterfaceConfig,
    Term, TrapEvent,
};
