//! Brocade IronWare unit.

pub mod interface;
pub mod network_instance;

use crate::common::InterfaceNames;
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::RegistryBuilder;

pub struct IronwareUnit;

impl Unit for IronwareUnit {
    fn device(&self) -> Device {
        Device::Brocade
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        let names = InterfaceNames::new(interface::SH_INTERFACES, interface::interface_names);
        builder
            .add_list_reader(pattern(paths::INTERFACE), names.interfaces())
            .add_list_reader(pattern(paths::SUBINTERFACE), names.subinterfaces())
            .add_writer(pattern(paths::INTERFACE_CONFIG), interface::InterfaceConfigWriter)
            .add_list_reader(pattern(paths::IPV4_ADDRESS), interface::Ipv4AddressReader)
            .add_reader(pattern(paths::IPV4_ADDRESS_CONFIG), interface::Ipv4ConfigReader);

        builder
            .add_list_reader(
                pattern(paths::NETWORK_INSTANCE),
                network_instance::instance_list_reader(),
            )
            .add_reader(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::instance_config_reader(),
            )
            .add_writer_after(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::instance_config_writer(),
                &[pattern(paths::INTERFACE_CONFIG)],
            )
            .add_list_reader(
                pattern(paths::CONNECTION_POINT),
                network_instance::ConnectionPointReader,
            )
            .subtree_add_writer_after(
                pattern(paths::CONNECTION_POINTS),
                network_instance::connection_points_writer(),
                &[pattern(paths::NETWORK_INSTANCE_CONFIG)],
            )
            .add_list_reader(pattern(paths::VLAN), network_instance::vlan_reader())
            .add_reader(pattern(paths::VLAN_CONFIG), network_instance::vlan_config_reader());
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[r"^Invalid input", r"^Error", r"^Incomplete command"]
    }
}
