//! Cisco IOS-XR unit.

pub mod acl;
pub mod bgp;
pub mod interface;
pub mod mpls;
pub mod oam;
pub mod ospf;
pub mod qos;
pub mod snmp;

use crate::common::{
    DefaultConfigReader, DefaultInstanceReader, InterfaceNames, MaskedIpv4Reader,
    interface_statements,
};
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::{CompositeListReader, RegistryBuilder};

pub struct XrUnit;

impl XrUnit {
    fn interfaces(builder: &mut RegistryBuilder) {
        let names = InterfaceNames::new(interface::SH_INTERFACES, interface_statements);
        builder
            .add_list_reader(pattern(paths::INTERFACE), names.interfaces())
            .add_reader(pattern(paths::AGGREGATION_CONFIG), interface::AggregationConfigReader)
            .add_list_reader(pattern(paths::SUBINTERFACE), names.subinterfaces())
            .add_list_reader(
                pattern(paths::IPV4_ADDRESS),
                MaskedIpv4Reader::new(interface::ipv4_command),
            )
            .add_reader(
                pattern(paths::IPV4_ADDRESS_CONFIG),
                MaskedIpv4Reader::new(interface::ipv4_command),
            );
    }

    fn routing(builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(pattern(paths::NETWORK_INSTANCE), DefaultInstanceReader)
            .add_reader(pattern(paths::NETWORK_INSTANCE_CONFIG), DefaultConfigReader)
            .add_list_reader(
                pattern(paths::PROTOCOL),
                CompositeListReader::new(vec![
                    Box::new(ospf::OspfProtocolReader),
                    Box::new(bgp::BgpProtocolReader),
                ]),
            );

        builder
            .add_reader(pattern(paths::OSPF_MAX_METRIC_CONFIG), ospf::MaxMetricReader)
            .add_writer(pattern(paths::OSPF_MAX_METRIC_CONFIG), ospf::MaxMetricWriter)
            .add_list_reader(pattern(paths::OSPF_AREA), ospf::AreaReader)
            .add_list_reader(pattern(paths::OSPF_AREA_INTERFACE), ospf::AreaInterfaceReader)
            .add_reader(
                pattern(paths::OSPF_AREA_INTERFACE_CONFIG),
                ospf::AreaInterfaceConfigReader,
            );

        builder
            .add_reader(pattern(paths::BGP_GLOBAL_CONFIG), bgp::GlobalConfigReader)
            .add_writer(pattern(paths::BGP_GLOBAL_CONFIG), bgp::GlobalConfigWriter)
            .add_list_reader(pattern(paths::LOCAL_AGGREGATE), bgp::LocalAggregateReader)
            .add_reader(pattern(paths::LOCAL_AGGREGATE_CONFIG), bgp::LocalAggregateReader)
            .add_writer_after(
                pattern(paths::BGP_PREFIX_LIMIT_CONFIG),
                bgp::PrefixLimitWriter,
                &[pattern(paths::BGP_GLOBAL_CONFIG)],
            );

        builder
            .add_list_reader(pattern(paths::TE_TUNNEL), mpls::TunnelReader)
            .add_reader(pattern(paths::TE_TUNNEL_CONFIG), mpls::TunnelConfigReader)
            .add_list_reader(pattern(paths::RSVP_INTERFACE), mpls::RsvpInterfaceReader);
    }

    fn services(builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(pattern(paths::ACL_INTERFACE), acl::AclInterfaceReader)
            .add_list_reader(pattern(paths::INGRESS_ACL_SET), acl::IngressAclSetReader)
            .add_list_reader(pattern(paths::EGRESS_ACL_SET), acl::EgressAclSetReader)
            .add_reader(pattern(paths::EGRESS_ACL_SET_CONFIG), acl::EgressAclSetConfigReader);

        builder
            .add_list_reader(pattern(paths::QOS_CLASSIFIER), qos::ClassifierReader)
            .add_list_reader(pattern(paths::QOS_TERM), qos::TermReader);

        builder
            .add_writer(pattern(paths::SNMP_INTERFACE_CONFIG), snmp::SnmpInterfaceWriter)
            .add_writer(pattern(paths::CFM_DOMAIN_CONFIG), oam::CfmDomainWriter)
            .add_writer_after(
                pattern(paths::CFM_MA_CONFIG),
                oam::CfmMaWriter,
                &[pattern(paths::CFM_DOMAIN_CONFIG)],
            );
    }
}

impl Unit for XrUnit {
    fn device(&self) -> Device {
        Device::IosXr
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        Self::interfaces(builder);
        Self::routing(builder);
        Self::services(builder);
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[
            r"^% Invalid input detected",
            r"^% Incomplete command",
            r"^% Ambiguous command",
            r"^% Failed to commit",
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{BgpGlobalConfig, CfmDomainConfig, CfmMaConfig, PrefixLimitConfig};
    use crate::{Device, registry_for};
    use serde_json::json;
    use translate::{ConfigPath, Data, MockChannel, NodeChange, Snapshot, Transaction};

    fn create<T: Data>(path: ConfigPath, data: &T) -> NodeChange {
        let snapshot = Snapshot::from_data(&path, data).unwrap();
        NodeChange::create(path, snapshot)
    }

    fn bgp(ni: &str) -> ConfigPath {
        ConfigPath::root()
            .keyed("network-instance", ni)
            .child("protocols")
            .keyed("protocol", "bgp default")
            .child("bgp")
    }

    #[test]
    fn test_process_created_before_neighbor_limit() {
        let registry = registry_for(Device::IosXr).unwrap();
        let channel = MockChannel::new();
        let tx = Transaction::new(&registry, &channel);

        let limit = bgp("default")
            .child("neighbors")
            .keyed("neighbor", "10.1.1.1")
            .child("afi-safis")
            .keyed("afi-safi", "ipv4-unicast")
            .child("ipv4-unicast")
            .child("prefix-limit")
            .child("config");
        let changes = [
            create(
                limit,
                &PrefixLimitConfig {
                    max_prefixes: Some(100),
                    shutdown_threshold_pct: None,
                },
            ),
            create(
                bgp("default").child("global").child("config"),
                &BgpGlobalConfig {
                    as_number: 65000,
                    router_id: None,
                },
            ),
        ];

        let summary = tx.commit(&changes).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(
            channel.executed(),
            [
                "router bgp 65000\nexit\n",
                "router bgp 65000\nneighbor 10.1.1.1\naddress-family ipv4 unicast\n\
                 maximum-prefix 100\nroot\n",
            ]
        );
    }

    #[test]
    fn test_domain_and_service_created_together() {
        let registry = registry_for(Device::IosXr).unwrap();
        let channel = MockChannel::new();
        let tx = Transaction::new(&registry, &channel);
        let domain = ConfigPath::root()
            .child("oam")
            .child("cfm")
            .child("domains")
            .keyed("domain", "D1");

        let changes = [
            create(
                domain.child("mas").keyed("ma", "M1").child("config"),
                &CfmMaConfig { ma_name: "M1".into() },
            ),
            create(
                domain.child("config"),
                &CfmDomainConfig {
                    domain_name: "D1".into(),
                    level: 2,
                },
            ),
        ];
        let plan = tx.plan(&changes).unwrap();
        let text: Vec<String> = plan.writes.iter().map(|w| w.commands.to_text()).collect();
        assert_eq!(
            text,
            [
                "ethernet cfm\ndomain D1 level 2\nroot\n",
                "ethernet cfm\ndomain D1 level 2\nservice M1 down-meps\nroot\n",
            ]
        );
    }

    #[test]
    fn test_read_bundle_interface() {
        let registry = registry_for(Device::IosXr).unwrap();
        let channel = MockChannel::new()
            .with_output(
                "show running-config | include ^interface",
                "interface Bundle-Ether1000\ninterface Bundle-Ether1000.200\n",
            )
            .with_output(
                "show running-config interface Bundle-Ether1000",
                "interface Bundle-Ether1000\n bundle minimum-active links 2\n!\n",
            )
            .with_output(
                "show running-config interface Bundle-Ether1000.200 | include ^ ipv4 address",
                " ipv4 address 192.168.2.1 255.255.255.252\n",
            );
        let tx = Transaction::new(&registry, &channel);

        let tree = tx
            .read_tree(&ConfigPath::root().keyed("interface", "Bundle-Ether1000"))
            .unwrap()
            .unwrap();
        assert_eq!(
            tree.as_value(),
            &json!({
                "name": "Bundle-Ether1000",
                "aggregation": {"config": {"min-links": 2}},
                "subinterfaces": {"subinterface": [
                    {"index": 0},
                    {
                        "index": 200,
                        "ipv4": {"addresses": {"address": [
                            {
                                "ip": "192.168.2.1",
                                "config": {"ip": "192.168.2.1", "prefix-length": 30}
                            }
                        ]}}
                    }
                ]}
            })
        );
    }

    #[test]
    fn test_aggregates_read_through_process_as() {
        let registry = registry_for(Device::IosXr).unwrap();
        let channel = MockChannel::new()
            .with_output(
                "show running-config router bgp",
                "router bgp 65000\n vrf CUST\n  address-family ipv4 unicast\n!\n",
            )
            .with_output(
                "show running-config router bgp 65000 vrf CUST",
                "router bgp 65000\n vrf CUST\n  address-family ipv4 unicast\n\
                 \x20  network 10.0.0.0/8 route-policy EXPORT\n   network 192.168.0.0/24\n",
            );
        let tx = Transaction::new(&registry, &channel);

        let aggregates = ConfigPath::root()
            .keyed("network-instance", "CUST")
            .child("protocols")
            .keyed("protocol", "bgp default")
            .child("local-aggregates")
            .child("aggregate");
        assert_eq!(tx.read_keys(&aggregates).unwrap(), ["10.0.0.0/8", "192.168.0.0/24"]);

        let config = tx
            .read(&aggregates.with_key("10.0.0.0/8").child("config"))
            .unwrap()
            .unwrap();
        assert_eq!(
            config.as_value(),
            &json!({"prefix": "10.0.0.0/8", "apply-policy": "EXPORT"})
        );
    }

    #[test]
    fn test_no_aggregates_without_process() {
        let registry = registry_for(Device::IosXr).unwrap();
        let channel = MockChannel::new();
        let tx = Transaction::new(&registry, &channel);

        let aggregates = ConfigPath::root()
            .keyed("network-instance", "default")
            .child("protocols")
            .keyed("protocol", "bgp default")
            .child("local-aggregates")
            .child("aggregate");
        assert!(tx.read_keys(&aggregates).unwrap().is_empty());
        assert_eq!(channel.executed(), ["show running-config router bgp"]);
    }
}
