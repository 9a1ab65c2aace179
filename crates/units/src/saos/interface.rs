//! SAOS ports and LAGs.
//!
//! Ports are configured with flat `port set port N ...` statements and every
//! change ends with `configuration save`. LAGs are listed but left alone.

use crate::common::compile;
use crate::model::{Interface, InterfaceConfig, InterfaceType, PortAttributes};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, Claim, CommandSequence, CompositeConfigReader, CompositeListReader,
    CompositeWriter, ConfigPath, ConfigReader, Error, Frame, Guarded, ListReader, Normalize,
    ReadContext, Reserved, Result, WriteContext, Writer, ensure_unchanged, extract,
};

const SH_PORTS: &str = "configuration search running-config string \"port set port\"";
const SH_LAGS: &str = "configuration search running-config string \"aggregation create\"";

/// Frame size a port falls back to when none is configured.
const DEFAULT_MAX_FRAME_SIZE: u16 = 9216;

static PORT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^port set port (?<id>\S+)").expect("port id regex"));
static LAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^aggregation create agg (?<name>\S+)").expect("lag name regex"));
static DISABLED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^port disable port \S+").expect("port disable regex"));
static MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^port set port \S+ mode (?<mode>\S+)").expect("port mode regex"));
static MAX_FRAME_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^port set port .*max-frame-size (?<size>\d+)").expect("max-frame-size regex")
});
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^port set port .*description (?:"(?<quoted>[^"]*)"|(?<plain>\S+))"#)
        .expect("description regex")
});
static QMAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^port set port .*ingress-to-egress-qmap (?<qmap>\S+)")
        .expect("ingress-to-egress-qmap regex")
});
static FRAME_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^port set port .*acceptable-frame-type (?<type>\S+)")
        .expect("acceptable-frame-type regex")
});
static INGRESS_FILTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^port set port .*vs-ingress-filter (?<state>on|off)")
        .expect("vs-ingress-filter regex")
});
static ETHERTYPE_POLICY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^virtual-circuit ethernet set port \S+ vlan-ethertype-policy (?<policy>\S+)")
        .expect("vlan-ethertype-policy regex")
});
static ACCESS_CONTROL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^flow access-control set port \S+(?<rest>.*)$").expect("access-control regex")
});
static MAX_MACS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"max-dynamic-macs (?<macs>\d+)").expect("max-dynamic-macs regex"));

// ============================================================================
// Readers
// ============================================================================

/// Physical ports with configuration statements.
pub struct PortReader;

impl PortReader {
    fn ids(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_PORTS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &PORT_ID, "id"))
    }
}

impl ListReader<Interface> for PortReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Self::ids(path, ctx)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Interface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("interface")?.to_string();
        Ok(())
    }
}

pub struct LagReader;

impl LagReader {
    fn names(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_LAGS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &LAG_NAME, "name"))
    }
}

impl ListReader<Interface> for LagReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Self::names(path, ctx)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Interface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("interface")?.to_string();
        Ok(())
    }
}

pub fn interface_list_reader() -> CompositeListReader<Interface> {
    CompositeListReader::new(vec![Box::new(PortReader), Box::new(LagReader)])
}

/// Lines of `output` that configure port `id`.
///
/// Searches by substring also return statements of other ports (`port 4`
/// while looking for `port 40`, or unrelated ports in the same block).
fn port_lines(path: &ConfigPath, output: &str, id: &str) -> Result<String> {
    let own = compile(path, &format!(r"\bport {}(?:\s|$)", regex::escape(id)))?;
    Ok(output
        .lines()
        .filter(|line| own.is_match(line))
        .map(|line| format!("{line}\n"))
        .collect())
}

/// Parse the configuration statements of port `id`.
pub fn parse_port(
    path: &ConfigPath,
    output: &str,
    id: &str,
    builder: &mut InterfaceConfig,
) -> Result<()> {
    let lines = port_lines(path, output, id)?;
    builder.name = id.to_string();
    builder.kind = InterfaceType::EthernetCsmacd;
    builder.enabled = Some(!lines.lines().any(|line| DISABLED.is_match(line)));
    builder.mtu = extract::extract_parsed(&lines, Normalize::None, &MAX_FRAME_SIZE, "size");
    builder.description = extract::extract_first(&lines, Normalize::None, &DESCRIPTION, |caps| {
        caps.name("quoted")
            .or_else(|| caps.name("plain"))
            .map(|m| m.as_str().to_string())
    });

    let flag = |pattern: &Regex, group: &str| {
        extract::extract_value(&lines, Normalize::None, pattern, group).map(|state| state == "on")
    };
    let access_control = extract::extract_value(&lines, Normalize::None, &ACCESS_CONTROL, "rest");
    let port = PortAttributes {
        physical_type: extract::extract_value(&lines, Normalize::None, &MODE, "mode"),
        acceptable_frame_type: extract::extract_value(&lines, Normalize::None, &FRAME_TYPE, "type"),
        vs_ingress_filter: flag(&INGRESS_FILTER, "state"),
        vlan_ethertype_policy: extract::extract_value(
            &lines,
            Normalize::None,
            &ETHERTYPE_POLICY,
            "policy",
        ),
        ingress_to_egress_qmap: extract::extract_value(&lines, Normalize::None, &QMAP, "qmap"),
        max_dynamic_macs: access_control
            .as_deref()
            .and_then(|rest| MAX_MACS.captures(rest))
            .and_then(|caps| caps["macs"].parse().ok()),
        forward_unlearned: access_control
            .as_deref()
            .map(|rest| !rest.contains("forward-unlearned off")),
    };
    builder.port = (port != PortAttributes::default()).then_some(port);
    Ok(())
}

pub struct PortConfigReader;

impl ConfigReader<InterfaceConfig> for PortConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut InterfaceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let id = path.require_key("interface")?;
        let output =
            ctx.read(path, &format!("configuration search running-config string \"port {id}\""))?;
        parse_port(path, &output, id, builder)
    }
}

pub struct LagConfigReader;

impl ConfigReader<InterfaceConfig> for LagConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut InterfaceConfig,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("interface")?.to_string();
        builder.kind = InterfaceType::Ieee8023adLag;
        Ok(())
    }
}

pub fn interface_config_reader() -> CompositeConfigReader<InterfaceConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(PortConfigReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            let id = path.require_key("interface")?;
            Ok(PortReader::ids(path, ctx)?.iter().any(|p| p == id))
        })),
        Box::new(Guarded::new(LagConfigReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            let name = path.require_key("interface")?;
            Ok(LagReader::names(path, ctx)?.iter().any(|l| l == name))
        })),
    ])
}

// ============================================================================
// Writers
// ============================================================================

fn quoted(description: &str) -> String {
    if description.contains(' ') {
        format!("\"{description}\"")
    } else {
        description.to_string()
    }
}

/// Writer for physical ports.
///
/// Only changed fields are rendered. A removed frame size is set back to
/// the device default since SAOS has no unset form for it.
pub struct PortConfigWriter;

impl Writer<InterfaceConfig> for PortConfigWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Err(Error::forbidden(path, "Physical interface cannot be created").with_after(after))
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        after: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "type", &before.kind, &after.kind)?;
        let name = &after.name;
        Ok(BlockBuilder::new(Frame::new(Vec::<String>::new(), ["configuration save"]))
            .flag(
                before.enabled,
                after.enabled,
                true,
                &format!("port enable port {name}"),
                &format!("port disable port {name}"),
            )
            .set_or_no(
                before.description.as_ref(),
                after.description.as_ref(),
                |d| format!("port set port {name} description {}", quoted(d)),
                |_| format!("port unset port {name} description"),
            )
            .set_or_no(
                before.mtu.as_ref(),
                after.mtu.as_ref(),
                |mtu| format!("port set port {name} max-frame-size {mtu}"),
                |_| format!("port set port {name} max-frame-size {DEFAULT_MAX_FRAME_SIZE}"),
            )
            .finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &InterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Err(Error::forbidden(path, "Physical interface cannot be deleted").with_before(before))
    }
}

pub fn interface_config_writer() -> CompositeWriter<InterfaceConfig> {
    CompositeWriter::new(vec![
        Box::new(Claim::new(PortConfigWriter, |_: &ConfigPath, c: &InterfaceConfig| {
            c.kind == InterfaceType::EthernetCsmacd
        })),
        Box::new(Reserved::new(
            "LAG interface is not permitted to be created, changed or deleted",
            |_: &ConfigPath, c: &InterfaceConfig| c.kind == InterfaceType::Ieee8023adLag,
        )),
    ])
}
