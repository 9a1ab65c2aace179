//! BGP processes, local aggregates and neighbor prefix limits.
//!
//! A process is named by its AS number and, for named instances, `instance
//! NAME`. The `default` protocol name is the unnamed instance. VRFs are
//! ` vrf NAME` sections inside the process.

use crate::model::{
    Aggregate, AggregateConfig, BgpGlobalConfig, DEFAULT_NETWORK, PrefixLimitConfig, Protocol,
    routing::{BGP, afi_safi_keyword, protocol_key, split_protocol_key},
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, ConfigReader, Error, Frame, ListReader, Normalize,
    ReadContext, Result, WriteContext, Writer, ensure_unchanged, extract,
};

const SH_BGP: &str = "show running-config router bgp";

static ROUTER_BGP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^router bgp (?<as>\d+)(?: instance (?<name>\S+))?\s*$").expect("router bgp regex")
});
static VRF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ vrf (?<vrf>\S+)").expect("bgp vrf regex"));
static ROUTER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*bgp router-id (?<id>\S+)").expect("router-id regex"));
static NETWORK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*network (?<prefix>\S+)(?: route-policy (?<policy>\S+))?")
        .expect("network regex")
});

/// One `router bgp` block of the running configuration.
struct Process {
    as_number: u32,
    name: String,
    body: String,
}

impl Process {
    /// Lines of the process that belong to `vrf`, or to the global table.
    fn scope(&self, vrf: Option<&str>) -> Option<String> {
        let mut lines = self.body.lines().skip(1);
        let scoped: Vec<&str> = match vrf {
            None => lines.by_ref().take_while(|l| !VRF.is_match(l)).collect(),
            Some(vrf) => {
                lines.by_ref().find(|l| VRF.captures(l).is_some_and(|c| &c["vrf"] == vrf))?;
                lines.take_while(|l| l.starts_with("  ")).collect()
            }
        };
        Some(scoped.join("\n"))
    }
}

fn processes(output: &str) -> Vec<Process> {
    extract::split_records(output, &ROUTER_BGP)
        .into_iter()
        .filter_map(|body| {
            let caps = ROUTER_BGP.captures(body.lines().next()?)?;
            Some(Process {
                as_number: caps["as"].parse().ok()?,
                name: caps
                    .name("name")
                    .map_or(DEFAULT_NETWORK, |m| m.as_str())
                    .to_string(),
                body: body.clone(),
            })
        })
        .collect()
}

/// ` instance NAME` suffix of the `router bgp` line, empty for the default instance.
fn instance_suffix(path: &ConfigPath) -> Result<String> {
    let key = path.require_key("protocol")?;
    match split_protocol_key(key) {
        Some((BGP, DEFAULT_NETWORK)) => Ok(String::new()),
        Some((BGP, name)) => Ok(format!(" instance {name}")),
        _ => Err(Error::invalid(path, format!("'{key}' is not a BGP protocol"))),
    }
}

/// VRF of the network instance, `None` for the global table.
fn vrf(path: &ConfigPath) -> Result<Option<&str>> {
    let ni = path.require_key("network-instance")?;
    Ok((ni != DEFAULT_NETWORK).then_some(ni))
}

fn router_line(path: &ConfigPath, as_number: u32) -> Result<String> {
    Ok(format!("router bgp {as_number}{}", instance_suffix(path)?))
}

// ============================================================================
// Readers
// ============================================================================

/// BGP processes present in a network instance.
pub struct BgpProtocolReader;

impl ListReader<Protocol> for BgpProtocolReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let vrf = vrf(path)?;
        let output = ctx.read(path, SH_BGP)?;
        Ok(processes(&output)
            .iter()
            .filter(|p| p.scope(vrf).is_some())
            .map(|p| protocol_key(BGP, &p.name))
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Protocol,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let key = path.require_key("protocol")?;
        if let Some((BGP, name)) = split_protocol_key(key) {
            builder.identifier = BGP.to_string();
            builder.name = name.to_string();
        }
        Ok(())
    }
}

/// AS number and router id of a process, per network instance.
pub struct GlobalConfigReader;

impl ConfigReader<BgpGlobalConfig> for GlobalConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut BgpGlobalConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let Some((BGP, name)) = split_protocol_key(path.require_key("protocol")?) else {
            return Ok(());
        };
        let output = ctx.read(path, SH_BGP)?;
        let vrf = vrf(path)?;
        let found = processes(&output)
            .into_iter()
            .find(|p| p.name == name)
            .and_then(|p| Some((p.as_number, p.scope(vrf)?)));
        if let Some((as_number, scope)) = found {
            builder.as_number = as_number;
            builder.router_id = extract::extract_value(&scope, Normalize::None, &ROUTER_ID, "id");
        }
        Ok(())
    }
}

/// `network` statements of a process, read through the AS number of its
/// global configuration.
pub struct LocalAggregateReader;

impl LocalAggregateReader {
    fn networks(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<AggregateConfig>> {
        let global = path
            .cut_at("protocol")
            .map(|protocol| protocol.child("bgp").child("global").child("config"))
            .ok_or_else(|| Error::contract(path, "aggregate outside a protocol"))?;
        let Some(process) = ctx.read_node::<BgpGlobalConfig>(&global)? else {
            return Ok(Vec::new());
        };
        let mut command = format!("{SH_BGP} {}{}", process.as_number, instance_suffix(path)?);
        if let Some(vrf) = vrf(path)? {
            command.push_str(&format!(" vrf {vrf}"));
        }
        let output = ctx.read(path, &command)?;
        Ok(extract::extract_all(&output, Normalize::None, &NETWORK, |caps| {
            Some(AggregateConfig {
                prefix: caps["prefix"].to_string(),
                apply_policy: caps.name("policy").map(|m| m.as_str().to_string()),
            })
        }))
    }
}

impl ListReader<Aggregate> for LocalAggregateReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(Self::networks(path, ctx)?
            .into_iter()
            .map(|n| n.prefix)
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Aggregate,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.prefix = path.require_key("aggregate")?.to_string();
        Ok(())
    }
}

impl ConfigReader<AggregateConfig> for LocalAggregateReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AggregateConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let prefix = path.require_key("aggregate")?;
        if let Some(found) = Self::networks(path, ctx)?.into_iter().find(|n| n.prefix == prefix) {
            *builder = found;
        }
        Ok(())
    }
}

// ============================================================================
// Writers
// ============================================================================

/// `.../bgp/global/config`: the process itself and its router id.
///
/// Changing the AS number would mean a different process, so it is rejected.
pub struct GlobalConfigWriter;

impl GlobalConfigWriter {
    fn frame(path: &ConfigPath, as_number: u32) -> Result<Frame> {
        let router = router_line(path, as_number)?;
        Ok(match vrf(path)? {
            None => Frame::new([router], ["exit"]),
            Some(vrf) => Frame::new([router, format!("vrf {vrf}")], ["root"]),
        })
    }

    fn router_id(
        builder: BlockBuilder,
        before: Option<&BgpGlobalConfig>,
        after: &BgpGlobalConfig,
    ) -> BlockBuilder {
        builder.set_or_no(
            before.and_then(|b| b.router_id.as_ref()),
            after.router_id.as_ref(),
            |id| format!("bgp router-id {id}"),
            |_| "no bgp router-id".to_string(),
        )
    }
}

impl Writer<BgpGlobalConfig> for GlobalConfigWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &BgpGlobalConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let builder = BlockBuilder::new(Self::frame(path, after.as_number)?);
        Ok(Self::router_id(builder, None, after).finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &BgpGlobalConfig,
        after: &BgpGlobalConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "as", &before.as_number, &after.as_number)?;
        let builder = BlockBuilder::new(Self::frame(path, after.as_number)?);
        Ok(Self::router_id(builder, Some(before), after).finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &BgpGlobalConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let router = router_line(path, before.as_number)?;
        Ok(match vrf(path)? {
            None => CommandSequence::line(format!("no {router}")),
            Some(vrf) => BlockBuilder::new(Frame::new([router], ["root"]))
                .line(format!("no vrf {vrf}"))
                .finish(),
        })
    }
}

/// `maximum-prefix` of one neighbor address family.
///
/// The owning process is found through the global config of the same
/// protocol in the transaction.
pub struct PrefixLimitWriter;

impl PrefixLimitWriter {
    fn global_config(path: &ConfigPath) -> Result<ConfigPath> {
        path.cut_at("protocol")
            .map(|protocol| protocol.child("bgp").child("global").child("config"))
            .ok_or_else(|| Error::contract(path, "prefix limit outside a protocol"))
    }

    fn frame(path: &ConfigPath, as_number: u32) -> Result<Frame> {
        let mut frame = Frame::new([router_line(path, as_number)?], ["root"]);
        if let Some(vrf) = vrf(path)? {
            frame = frame.enter(format!("vrf {vrf}"));
        }
        Ok(frame
            .enter(format!("neighbor {}", path.require_key("neighbor")?))
            .enter(format!("address-family {}", afi_safi_keyword(path.require_key("afi-safi")?))))
    }

    fn write(
        path: &ConfigPath,
        before: Option<&PrefixLimitConfig>,
        after: &PrefixLimitConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let global = Self::global_config(path)?;
        let Some(process) = ctx.after::<BgpGlobalConfig>(&global)? else {
            return Err(Error::invalid(path, "BGP process is not configured for this neighbor"));
        };
        let limit = |config: &PrefixLimitConfig| {
            config
                .max_prefixes
                .map(|max| (max, config.shutdown_threshold_pct))
        };
        Ok(BlockBuilder::new(Self::frame(path, process.as_number)?)
            .set_or_no(
                before.and_then(limit).as_ref(),
                limit(after).as_ref(),
                |(max, pct)| match pct {
                    Some(pct) => format!("maximum-prefix {max} {pct}"),
                    None => format!("maximum-prefix {max}"),
                },
                |_| "no maximum-prefix".to_string(),
            )
            .finish())
    }
}

impl Writer<PrefixLimitConfig> for PrefixLimitWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &PrefixLimitConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Self::write(path, None, after, ctx)
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &PrefixLimitConfig,
        after: &PrefixLimitConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Self::write(path, Some(before), after, ctx)
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &PrefixLimitConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let global = Self::global_config(path)?;
        let Some(process) = ctx.before::<BgpGlobalConfig>(&global)? else {
            return Ok(CommandSequence::empty());
        };
        if before.max_prefixes.is_none() {
            return Ok(CommandSequence::empty());
        }
        Ok(BlockBuilder::new(Self::frame(path, process.as_number)?)
            .line("no maximum-prefix")
            .finish())
    }
}
