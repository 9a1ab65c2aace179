//! Huawei VRP unit.

pub mod bgp;
pub mod interface;
pub mod network_instance;

use crate::common::InterfaceNames;
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::RegistryBuilder;

pub struct VrpUnit;

impl Unit for VrpUnit {
    fn device(&self) -> Device {
        Device::Huawei
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        let names = InterfaceNames::new(interface::SH_INTERFACES, interface::interface_names);
        builder
            .add_list_reader(pattern(paths::INTERFACE), names.interfaces())
            .add_list_reader(pattern(paths::SUBINTERFACE), names.subinterfaces())
            .add_writer(pattern(paths::INTERFACE_CONFIG), interface::InterfaceConfigWriter)
            .add_list_reader(pattern(paths::IPV4_ADDRESS), interface::Ipv4AddressReader)
            .add_reader(pattern(paths::IPV4_ADDRESS_CONFIG), interface::Ipv4AddressReader);

        builder
            .add_list_reader(pattern(paths::NETWORK_INSTANCE), network_instance::VpnInstanceReader)
            .add_reader(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::instance_config_reader(),
            )
            .add_writer_after(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                network_instance::instance_config_writer(),
                &[pattern(paths::INTERFACE_CONFIG)],
            );

        builder
            .add_writer_after(
                pattern(paths::BGP_GLOBAL_CONFIG),
                bgp::GlobalConfigWriter,
                &[pattern(paths::NETWORK_INSTANCE_CONFIG)],
            )
            .add_writer_after(
                pattern(paths::BGP_AFI_SAFI_CONFIG),
                bgp::AfiSafiWriter,
                &[pattern(paths::BGP_GLOBAL_CONFIG)],
            )
            .subtree_add_writer_after(
                pattern(paths::BGP_NEIGHBOR),
                bgp::NeighborWriter,
                &[pattern(paths::BGP_AFI_SAFI_CONFIG)],
            );
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[r"^Error:", r"^\s*\^$", r"Unrecognized command", r"^Warning: .* failed"]
    }
}
