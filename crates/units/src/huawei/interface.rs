//! VRP interface config and IPv4 addresses.
//!
//! Every change runs in `system-view` and is committed before returning to
//! user view. Attributes are removed with `undo`.

use crate::common::numeric_key;
use crate::model::{InterfaceConfig, InterfaceType, Ipv4Address, Ipv4AddressConfig};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, ConfigReader, Error, Frame, ListReader, Normalize,
    ReadContext, Result, WriteContext, Writer, ensure_unchanged, extract,
};

pub const SH_INTERFACES: &str = "display interface brief";

static BRIEF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<name>\S+)\s+(?:\*down|\^down|down|up)\s").expect("interface brief regex")
});
static IP_BRIEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<id>\S+)\s+(?<ip>[^/\s]+)/(?<prefix>[0-9]+)\s+").expect("ip brief regex")
});

/// Interface names of `display interface brief`, legend and header skipped.
pub fn interface_names(output: &str) -> Vec<String> {
    extract::extract_keys(output, Normalize::None, &BRIEF_LINE, "name")
}

fn frame(name: &str) -> Frame {
    Frame::new(["system-view".to_string(), format!("interface {name}")], ["commit", "return"])
}

fn attributes(
    builder: BlockBuilder,
    before: Option<&InterfaceConfig>,
    after: &InterfaceConfig,
) -> BlockBuilder {
    builder
        .set_or_no(
            before.and_then(|b| b.mtu.as_ref()),
            after.mtu.as_ref(),
            |mtu| format!("mtu {mtu}"),
            |_| "undo mtu".to_string(),
        )
        .set_or_no(
            before.and_then(|b| b.description.as_ref()),
            after.description.as_ref(),
            |d| format!("description {d}"),
            |_| "undo description".to_string(),
        )
        .flag(
            before.and_then(|b| b.enabled),
            after.enabled,
            true,
            "undo shutdown",
            "shutdown",
        )
}

fn check_loopback(path: &ConfigPath, config: &InterfaceConfig) -> Result<()> {
    if config.kind == InterfaceType::SoftwareLoopback && config.mtu.is_some() {
        return Err(Error::invalid(path, "Cannot configure mtu for loopback interface"));
    }
    Ok(())
}

/// Writer for `/interface[name]/config`.
///
/// Physical ports can only be reconfigured; logical interfaces are created
/// by entering them.
pub struct InterfaceConfigWriter;

impl Writer<InterfaceConfig> for InterfaceConfigWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if after.kind.is_physical() {
            return Err(
                Error::forbidden(path, "Cannot create physical interface").with_after(after)
            );
        }
        check_loopback(path, after)?;
        // the block is sent even without attributes since entering creates the interface
        Ok(attributes(BlockBuilder::new(frame(&after.name)), None, after).finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "type", &before.kind, &after.kind)?;
        check_loopback(path, after)?;
        Ok(attributes(BlockBuilder::new(frame(&after.name)), Some(before), after).finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if before.kind.is_physical() {
            return Err(
                Error::forbidden(path, "Physical interface cannot be deleted").with_before(before)
            );
        }
        Ok(BlockBuilder::new(Frame::new(["system-view"], ["commit", "return"]))
            .line(format!("undo interface {}", before.name))
            .finish())
    }
}

// ============================================================================
// IPv4
// ============================================================================

/// Primary address of the interface itself.
///
/// `display ip interface brief` has no subinterface detail, so subinterfaces
/// other than 0 have no addresses.
pub struct Ipv4AddressReader;

impl Ipv4AddressReader {
    fn address(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Option<(String, Option<u8>)>> {
        let interface = path.require_key("interface")?;
        let index: u32 = numeric_key(path, "subinterface")?;
        if index != 0 {
            return Ok(None);
        }
        let output = ctx.read(path, &format!("display ip interface brief {interface}"))?;
        Ok(extract::extract_first(&output, Normalize::None, &IP_BRIEF, |caps| {
            (&caps["id"] == interface)
                .then(|| (caps["ip"].to_string(), caps["prefix"].parse().ok()))
        }))
    }
}

impl ListReader<Ipv4Address> for Ipv4AddressReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(Self::address(path, ctx)?.map(|(ip, _)| ip).into_iter().collect())
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

impl ConfigReader<Ipv4AddressConfig> for Ipv4AddressReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Ipv4AddressConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let ip = path.require_key("address")?;
        if let Some((found, prefix)) = Self::address(path, ctx)?.filter(|(found, _)| found == ip) {
            builder.ip = found;
            builder.prefix_length = prefix;
        }
        Ok(())
    }
}
