//! Cisco IOS unit.

pub mod bgp;
pub mod mpls;
pub mod network_instance;
pub mod routing;

use crate::common::{InterfaceNames, MaskedIpv4Reader, interface_statements};
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::RegistryBuilder;

pub struct IosUnit;

const SH_INTERFACES: &str = "show running-config | include ^interface";

fn ipv4_command(interface: &str) -> String {
    format!("show running-config interface {interface} | include ^ ip address")
}

impl Unit for IosUnit {
    fn device(&self) -> Device {
        Device::Ios
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        let names = InterfaceNames::new(SH_INTERFACES, interface_statements);
        builder
            .add_list_reader(pattern(paths::INTERFACE), names.interfaces())
            .add_list_reader(pattern(paths::SUBINTERFACE), names.subinterfaces())
            .add_list_reader(pattern(paths::IPV4_ADDRESS), MaskedIpv4Reader::new(ipv4_command))
            .add_reader(pattern(paths::IPV4_ADDRESS_CONFIG), MaskedIpv4Reader::new(ipv4_command));

        builder
            .add_list_reader(pattern(paths::NETWORK_INSTANCE), network_instance::VrfReader)
            .add_reader(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::vrf_config_reader(),
            )
            .add_writer(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::vrf_config_writer(),
            );

        builder
            .add_list_reader(pattern(paths::PROTOCOL), routing::protocol_reader())
            .add_list_reader(pattern(paths::STATIC_ROUTE), routing::StaticRouteReader)
            .add_list_reader(pattern(paths::NEXT_HOP), routing::NextHopReader)
            .add_reader(pattern(paths::NEXT_HOP_STATE), routing::NextHopStateReader)
            .add_list_reader(pattern(paths::BGP_PEER_GROUP), bgp::PeerGroupReader)
            .add_list_reader(pattern(paths::BGP_PEER_GROUP_AFI_SAFI), bgp::PeerGroupAfiSafiReader);

        builder.add_writer_after(
            pattern(paths::LDP_INTERFACE_CONFIG),
            mpls::LdpInterfaceWriter,
            &[pattern(paths::NETWORK_INSTANCE_CONFIG)],
        );
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[
            r"^% Invalid input detected",
            r"^% Incomplete command",
            r"^% Ambiguous command",
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::{Device, registry_for};
    use serde_json::json;
    use translate::{ConfigPath, MockChannel, Transaction, TransactionOptions};

    #[test]
    fn test_read_instances_tree() {
        let registry = registry_for(Device::Ios).unwrap();
        let channel = MockChannel::new()
            .with_output(super::network_instance::SH_VRFS, "ip vrf TEST\n")
            .with_output(
                "show running-config | include ^ip vrf|^ rd",
                "ip vrf TEST\n rd 65002:1\n",
            )
            .with_output("sh run | include ospf", "router ospf 1\nrouter ospf 2 vrf TEST\n");
        let tx = Transaction::new(&registry, &channel).with_options(TransactionOptions {
            jobs: 2,
            ..TransactionOptions::default()
        });

        let tree = tx
            .read_tree(&ConfigPath::root().keyed("network-instance", "TEST"))
            .unwrap()
            .unwrap();
        assert_eq!(
            tree.as_value(),
            &json!({
                "name": "TEST",
                "config": {"name": "TEST", "type": "L3VRF", "route-distinguisher": "65002:1"},
                "protocols": {"protocol": [{"identifier": "ospf", "name": "2"}]}
            })
        );
    }

    #[test]
    fn test_read_interface_addresses() {
        let registry = registry_for(Device::Ios).unwrap();
        let channel = MockChannel::new()
            .with_output(
                "show running-config | include ^interface",
                "interface GigabitEthernet1\ninterface GigabitEthernet1.10\n",
            )
            .with_output(
                "show running-config interface GigabitEthernet1 | include ^ ip address",
                " ip address 10.0.0.1 255.255.255.0\n",
            );
        let tx = Transaction::new(&registry, &channel);

        let tree = tx
            .read_tree(&ConfigPath::root().keyed("interface", "GigabitEthernet1"))
            .unwrap()
            .unwrap();
        assert_eq!(
            tree.as_value(),
            &json!({
                "name": "GigabitEthernet1",
                "subinterfaces": {"subinterface": [
                    {
                        "index": 0,
                        "ipv4": {"addresses": {"address": [
                            {"ip": "10.0.0.1", "config": {"ip": "10.0.0.1", "prefix-length": 24}}
                        ]}}
                    },
                    {"index": 10}
                ]}
            })
        );
    }

    #[test]
    fn test_four_instance_keys() {
        let registry = registry_for(Device::Ios).unwrap();
        let channel = MockChannel::new().with_output(
            super::network_instance::SH_VRFS,
            "ip vrf A\nip vrf B\nip vrf C\n",
        );
        let tx = Transaction::new(&registry, &channel);
        let keys = tx.read_keys(&ConfigPath::root().child("network-instance")).unwrap();
        assert_eq!(keys, ["A", "B", "C", "default"]);
    }
}
