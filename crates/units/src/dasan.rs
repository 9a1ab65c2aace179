//! Dasan NOS unit.
//!
//! Only the global routing instance is modelled; it is listed and read but
//! never written.

use crate::common::{DefaultInstanceReader, default_config_child, reserved_default_writer};
use crate::model::{NetworkInstance, NetworkInstanceConfig};
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::{CompositeConfigReader, CompositeListReader, CompositeWriter, RegistryBuilder};

pub fn instance_list_reader() -> CompositeListReader<NetworkInstance> {
    CompositeListReader::new(vec![Box::new(DefaultInstanceReader)])
}

pub struct DasanUnit;

impl Unit for DasanUnit {
    fn device(&self) -> Device {
        Device::Dasan
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(pattern(paths::NETWORK_INSTANCE), instance_list_reader())
            .add_reader(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                CompositeConfigReader::<NetworkInstanceConfig>::new(vec![
                    Box::new(default_config_child()),
                ]),
            )
            .add_writer(
                pattern(paths::NETWORK_INSTANCE_CONFIG),
                CompositeWriter::<NetworkInstanceConfig>::new(vec![
                    Box::new(reserved_default_writer()),
                ]),
            );
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[r"^% Invalid", r"^% Incomplete", r"^% Unknown command"]
    }
}
