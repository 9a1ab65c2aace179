//! IOS-XR interface names, LACP bundle settings and IPv4 read command.

use crate::model::{AggregationConfig, InterfaceType};
use regex::Regex;
use std::sync::LazyLock;
use translate::{ConfigPath, ConfigReader, Normalize, ReadContext, Result, extract};

pub const SH_INTERFACES: &str = "show running-config | include ^interface";

static MINIMUM_LINKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*bundle minimum-active links (?<links>\d+)").expect("minimum links regex")
});

/// Interface type implied by an XR interface name.
#[must_use]
pub fn interface_type(name: &str) -> InterfaceType {
    if name.contains('.') {
        InterfaceType::L2vlan
    } else if name.starts_with("Bundle-Ether") {
        InterfaceType::Ieee8023adLag
    } else if name.starts_with("Loopback") {
        InterfaceType::SoftwareLoopback
    } else if name.starts_with("tunnel-te") {
        InterfaceType::Tunnel
    } else if name.starts_with("Null") || name.starts_with("MgmtEth") {
        InterfaceType::Other
    } else {
        InterfaceType::EthernetCsmacd
    }
}

pub fn ipv4_command(interface: &str) -> String {
    format!("show running-config interface {interface} | include ^ ipv4 address")
}

/// `bundle minimum-active links` of a bundle interface.
pub struct AggregationConfigReader;

impl ConfigReader<AggregationConfig> for AggregationConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AggregationConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("interface")?;
        if interface_type(name) != InterfaceType::Ieee8023adLag {
            return Ok(());
        }
        let output = ctx.read(path, &format!("show running-config interface {name}"))?;
        builder.min_links =
            extract::extract_parsed(&output, Normalize::None, &MINIMUM_LINKS, "links");
        Ok(())
    }
}
