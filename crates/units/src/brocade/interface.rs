//! IronWare interface and IPv4 address handlers.

use crate::model::{
    InterfaceConfig, InterfaceType, Ipv4Address, Ipv4AddressConfig, interface::subinterface_name,
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, ConfigReader, Error, Frame, ListReader, Normalize,
    ReadContext, Result, WriteContext, Writer, ensure_unchanged, extract,
};

static LOOPBACK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Loopback(?<number>[0-9]+)$").expect("loopback name regex"));

static INTERFACE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^interface (?<kind>\S+) (?<id>\S+)").expect("interface line regex")
});

static IP_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*ip address (?<ip>[0-9.]+)/(?<prefix>[0-9]+)").expect("ip address regex")
});

/// Number of a loopback named `Loopback<N>`.
fn loopback_number<'a>(path: &ConfigPath, name: &'a str) -> Result<&'a str> {
    LOOPBACK_NAME
        .captures(name)
        .and_then(|caps| caps.name("number"))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            Error::invalid(
                path,
                format!("Loopback name must be in format: Loopback45, not: {name}"),
            )
        })
}

/// Port number of a physical interface (`ethernet 1/1`, `Ethernet1/1` → `1/1`).
fn port_number(name: &str) -> &str {
    name.trim_start_matches(|c: char| c.is_ascii_alphabetic()).trim()
}

fn loopback_frame(number: &str) -> Frame {
    Frame::new(
        ["configure terminal".to_string(), format!("interface loopback {number}")],
        ["end"],
    )
}

fn ethernet_frame(name: &str) -> Frame {
    Frame::new(
        [
            "configure terminal".to_string(),
            format!("interface ethernet {}", port_number(name)),
        ],
        ["end"],
    )
}

/// Common attribute lines, rendered as a minimal diff against `before`.
fn attributes(
    builder: BlockBuilder,
    before: Option<&InterfaceConfig>,
    after: &InterfaceConfig,
) -> BlockBuilder {
    builder
        .set_or_no(
            before.and_then(|b| b.description.as_ref()),
            after.description.as_ref(),
            |d| format!("port-name {d}"),
            |_| "no port-name".to_string(),
        )
        .flag(before.and_then(|b| b.enabled), after.enabled, true, "enable", "disable")
}

/// Writer for `/interface[name]/config`.
///
/// Only loopbacks can be created or removed. Physical ports accept in-place
/// updates; the type of an existing interface never changes.
pub struct InterfaceConfigWriter;

impl Writer<InterfaceConfig> for InterfaceConfigWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if after.kind != InterfaceType::SoftwareLoopback {
            return Err(Error::unsupported_type(
                path,
                format!("Cannot create interface of type: {}", after.kind),
            ));
        }
        if after.mtu.is_some() {
            return Err(Error::invalid(
                path,
                format!("Cannot configure mtu for interface {} of type {}", after.name, after.kind),
            ));
        }
        let number = loopback_number(path, &after.name)?;
        let builder = BlockBuilder::new(loopback_frame(number))
            .opt(after.description.as_ref(), |d| format!("port-name {d}"))
            .line(if after.enabled.unwrap_or(true) { "enable" } else { "disable" });
        Ok(builder.finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "interface type", &before.kind, &after.kind)?;
        match after.kind {
            InterfaceType::SoftwareLoopback => {
                let number = loopback_number(path, &after.name)?;
                let builder = BlockBuilder::new(loopback_frame(number));
                Ok(attributes(builder, Some(before), after).finish())
            }
            InterfaceType::EthernetCsmacd => {
                let builder = BlockBuilder::new(ethernet_frame(&after.name));
                let builder = attributes(builder, Some(before), after)
                    .set_or_no(
                        before.mtu.as_ref(),
                        after.mtu.as_ref(),
                        |mtu| format!("mtu {mtu}"),
                        |_| "no mtu".to_string(),
                    );
                Ok(builder.finish())
            }
            other => Err(Error::unsupported_type(
                path,
                format!("Cannot update interface of type: {other}"),
            )),
        }
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        match before.kind {
            InterfaceType::EthernetCsmacd => {
                Err(Error::forbidden(path, "Physical interface cannot be deleted"))
            }
            InterfaceType::SoftwareLoopback => {
                let number = loopback_number(path, &before.name)?;
                Ok(BlockBuilder::new(Frame::new(["configure terminal"], ["end"]))
                    .line(format!("no interface loopback {number}"))
                    .finish())
            }
            other => Err(Error::unsupported_type(
                path,
                format!("Cannot delete interface of type: {other}"),
            )),
        }
    }
}

pub const SH_INTERFACES: &str = "show running-config | include ^interface";

/// Interface names as the model uses them: `Loopback1`, `ethernet 1/1`, `ve 10`.
pub fn interface_names(output: &str) -> Vec<String> {
    extract::extract_all(output, Normalize::None, &INTERFACE_LINE, |caps| {
        Some(match &caps["kind"] {
            "loopback" => format!("Loopback{}", &caps["id"]),
            kind => format!("{kind} {}", &caps["id"]),
        })
    })
}

// ============================================================================
// IPv4
// ============================================================================

fn address_command(path: &ConfigPath) -> Result<String> {
    let interface = path.require_key("interface")?;
    let index: u32 = crate::common::numeric_key(path, "subinterface")?;
    Ok(format!(
        "show running-config interface {} | include ip address",
        subinterface_name(interface, index)
    ))
}

fn addresses(output: &str) -> Vec<(String, Option<u8>)> {
    extract::extract_all(output, Normalize::None, &IP_ADDRESS, |caps| {
        Some((
            caps["ip"].to_string(),
            caps["prefix"].parse().ok(),
        ))
    })
}

/// Addresses configured in `ip/prefix` notation.
pub struct Ipv4AddressReader;

impl ListReader<Ipv4Address> for Ipv4AddressReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, &address_command(path)?)?;
        Ok(addresses(&output).into_iter().map(|(ip, _)| ip).collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Ipv4Address,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.ip = path.require_key("address")?.to_string();
        Ok(())
    }
}

pub struct Ipv4ConfigReader;

impl ConfigReader<Ipv4AddressConfig> for Ipv4ConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Ipv4AddressConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let ip = path.require_key("address")?;
        let output = ctx.read(path, &address_command(path)?)?;
        if let Some((_, prefix)) = addresses(&output).into_iter().find(|(found, _)| found == ip) {
            builder.ip = ip.to_string();
            builder.prefix_length = prefix;
        }
        Ok(())
    }
}
