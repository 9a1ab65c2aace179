//! IOS routing protocol instances and static route state.

use crate::common::compile;
use crate::model::{
    DEFAULT_NETWORK, NextHop, NextHopState, Protocol, StaticRoute,
    routing::{OSPF, STATIC, protocol_key, split_protocol_key},
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    CompositeListReader, ConfigPath, ConfigReader, Error, ListReader, Normalize, ReadContext,
    Result, extract,
};

const SH_OSPF: &str = "sh run | include ospf";
const SH_STATIC: &str = "show running-config | include ^ip route";

static ROUTER_OSPF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*router ospf (?<id>\S+)\s*$").expect("router ospf regex"));
static ROUTER_OSPF_VRF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*router ospf (?<id>\S+) vrf (?<vrf>\S+)\s*$").expect("router ospf vrf regex")
});
static IP_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ip route (?:vrf (?<vrf>\S+) )?(?<net>[0-9.]+) (?<mask>[0-9.]+) (?<hops>.+)$")
        .expect("ip route regex")
});
static METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?<metric>\d+)/\d+\]").expect("metric regex"));

fn network_instance(path: &ConfigPath) -> Result<&str> {
    path.require_key("network-instance")
}

fn populate_protocol(path: &ConfigPath, builder: &mut Protocol) -> Result<()> {
    let key = path.require_key("protocol")?;
    let (identifier, name) = split_protocol_key(key)
        .ok_or_else(|| Error::contract(path, format!("malformed protocol key '{key}'")))?;
    builder.identifier = identifier.to_string();
    builder.name = name.to_string();
    Ok(())
}

/// OSPF processes of one network instance.
///
/// The default instance owns `router ospf N` lines; a VRF owns
/// `router ospf N vrf NAME` lines naming it.
pub struct OspfProtocolReader;

impl ListReader<Protocol> for OspfProtocolReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let vrf = network_instance(path)?;
        let output = ctx.read(path, SH_OSPF)?;
        let ids = if vrf == DEFAULT_NETWORK {
            extract::extract_keys(&output, Normalize::None, &ROUTER_OSPF, "id")
        } else {
            let named = compile(path, &format!(r"\bvrf {}(\s|$)", regex::escape(vrf)))?;
            let lines: String = output
                .lines()
                .filter(|line| named.is_match(line))
                .collect::<Vec<_>>()
                .join("\n");
            let mut seen = Vec::new();
            for id in extract::extract_all(&lines, Normalize::None, &ROUTER_OSPF_VRF, |caps| {
                (&caps["vrf"] == vrf).then(|| caps["id"].to_string())
            }) {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
            seen
        };
        Ok(ids.iter().map(|id| protocol_key(OSPF, id)).collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Protocol,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        populate_protocol(path, builder)
    }
}

/// The static routing pseudo-protocol, present when the instance has routes.
pub struct StaticProtocolReader;

impl ListReader<Protocol> for StaticProtocolReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let vrf = network_instance(path)?;
        let output = ctx.read(path, SH_STATIC)?;
        let present = output.lines().any(|line| {
            let Some(rest) = line.strip_prefix("ip route ") else {
                return false;
            };
            match rest.strip_prefix("vrf ") {
                Some(named) => named.split_whitespace().next() == Some(vrf),
                None => vrf == DEFAULT_NETWORK,
            }
        });
        Ok(if present {
            vec![protocol_key(STATIC, vrf)]
        } else {
            Vec::new()
        })
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Protocol,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        populate_protocol(path, builder)
    }
}

pub fn protocol_reader() -> CompositeListReader<Protocol> {
    CompositeListReader::new(vec![
        Box::new(OspfProtocolReader),
        Box::new(super::bgp::BgpProtocolReader),
        Box::new(StaticProtocolReader),
    ])
}

/// One `ip route` line of a network instance.
struct Route {
    prefix: String,
    next_hop: String,
}

/// Words ending the next-hop part of an `ip route` line.
const ROUTE_OPTIONS: &[&str] = &["name", "tag", "permanent", "track", "global", "multicast"];

/// Interface and address of a next hop, dropping distance and options.
fn next_hop_index(hops: &str) -> String {
    hops.split_whitespace()
        .take_while(|word| {
            !word.chars().all(|c| c.is_ascii_digit()) && !ROUTE_OPTIONS.contains(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn routes(output: &str, vrf: &str) -> Vec<Route> {
    extract::extract_all(output, Normalize::None, &IP_ROUTE, |caps| {
        let owner = caps.name("vrf").map_or(DEFAULT_NETWORK, |m| m.as_str());
        if owner != vrf {
            return None;
        }
        let prefix_length = extract::mask_to_prefix(&caps["mask"])?;
        Some(Route {
            prefix: format!("{}/{prefix_length}", &caps["net"]),
            next_hop: next_hop_index(&caps["hops"]),
        })
    })
}

/// Routes of the static protocol instance; other protocols have none.
fn static_routes(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<Route>> {
    let key = path.require_key("protocol")?;
    if split_protocol_key(key).is_none_or(|(identifier, _)| identifier != STATIC) {
        return Ok(Vec::new());
    }
    let output = ctx.read(path, SH_STATIC)?;
    Ok(routes(&output, network_instance(path)?))
}

/// Prefixes of `.../static-routes/static`.
pub struct StaticRouteReader;

impl ListReader<StaticRoute> for StaticRouteReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let mut prefixes: Vec<String> = Vec::new();
        for route in static_routes(path, ctx)? {
            if !prefixes.contains(&route.prefix) {
                prefixes.push(route.prefix);
            }
        }
        Ok(prefixes)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut StaticRoute,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.prefix = path.require_key("static")?.to_string();
        Ok(())
    }
}

/// Next hops of one static prefix.
pub struct NextHopReader;

impl ListReader<NextHop> for NextHopReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let prefix = path.require_key("static")?;
        Ok(static_routes(path, ctx)?
            .into_iter()
            .filter(|route| route.prefix == prefix && !route.next_hop.is_empty())
            .map(|route| route.next_hop)
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NextHop,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.index = path.require_key("next-hop")?.to_string();
        Ok(())
    }
}

/// Reverse the `interface address` order of a next-hop index for `include`.
fn switch_index(index: &str) -> String {
    index.split(' ').rev().collect::<Vec<_>>().join(" ")
}

/// Metric of one static next hop.
pub struct NextHopStateReader;

impl NextHopStateReader {
    fn command(path: &ConfigPath) -> Result<String> {
        let key = path.require_key("protocol")?;
        let name = split_protocol_key(key).map_or(key, |(_, name)| name);
        let prefix = path.require_key("static")?;
        let index = switch_index(path.require_key("next-hop")?);
        Ok(if name == DEFAULT_NETWORK {
            format!("sh ip static route {prefix} | include {index}")
        } else {
            format!("sh ip static route vrf {name} {prefix} | include {index}")
        })
    }
}

impl ConfigReader<NextHopState> for NextHopStateReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NextHopState,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let output = ctx.read(path, &Self::command(path)?)?;
        builder.index = path.require_key("next-hop")?.to_string();
        builder.metric = extract::extract_parsed(&output, Normalize::None, &METRIC, "metric");
        Ok(())
    }
}
