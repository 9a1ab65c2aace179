//! Ciena SAOS units: SAOS 6 and the virtual switches of SAOS 8.

pub mod interface;
pub mod qos;
pub mod ring;
pub mod virtual_switch;

use crate::common::{DefaultConfigReader, DefaultInstanceReader};
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::RegistryBuilder;

const ERROR_PATTERNS: &[&str] = &[r"^SHELL PARSER FAILURE", r"^ERROR:", r"^\s*\^\s*$"];

pub struct SaosUnit;

impl Unit for SaosUnit {
    fn device(&self) -> Device {
        Device::Saos
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(pattern(paths::INTERFACE), interface::interface_list_reader())
            .add_reader(pattern(paths::INTERFACE_CONFIG), interface::interface_config_reader())
            .add_writer(pattern(paths::INTERFACE_CONFIG), interface::interface_config_writer());

        builder
            .add_list_reader(pattern(paths::SCHEDULER_POLICY), qos::scheduler_policy_reader())
            .add_reader(pattern(paths::SCHEDULER_POLICY_CONFIG), qos::scheduler_config_reader())
            .add_writer_after(
                pattern(paths::SCHEDULER_POLICY_CONFIG),
                qos::scheduler_config_writer(),
                &[pattern(paths::INTERFACE_CONFIG)],
            );

        builder
            .add_list_reader(pattern(paths::NETWORK_INSTANCE), DefaultInstanceReader)
            .add_reader(pattern(paths::NETWORK_INSTANCE_CONFIG), DefaultConfigReader)
            .add_list_reader(pattern(paths::VLAN), ring::vlan_reader())
            .add_list_reader(pattern(paths::VLAN_VIRTUAL_RING), ring::VirtualRingReader)
            .add_writer(pattern(paths::LOGICAL_RING_CONFIG), ring::virtual_ring_writer());
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        ERROR_PATTERNS
    }
}

pub struct Saos8Unit;

impl Unit for Saos8Unit {
    fn device(&self) -> Device {
        Device::Saos8
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(
                pattern(paths::NETWORK_INSTANCE),
                virtual_switch::instance_list_reader(),
            )
            .add_reader(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                virtual_switch::instance_config_reader(),
            )
            .add_list_reader(pattern(paths::INSTANCE_INTERFACE), virtual_switch::SubPortReader)
            .add_reader(
                pattern(paths::INSTANCE_INTERFACE_CONFIG),
                virtual_switch::SubPortConfigReader,
            );
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        ERROR_PATTERNS
    }
}
