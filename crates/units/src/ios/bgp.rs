//! IOS BGP process, peer groups and the address families they are active in.
//!
//! Everything is read from the `router bgp` section. Address families of a
//! VRF carry the VRF in their header:
//!
//! ```text
//! router bgp 17676
//!  neighbor group_a peer-group
//!  address-family ipv4
//!   neighbor group_a route-reflector-client
//!  address-family ipv4 vrf CUST
//!   neighbor group_b activate
//! ```

use crate::common::compile;
use crate::model::{
    AfiSafi, DEFAULT_NETWORK, PeerGroup, Protocol,
    routing::{BGP, afi_safi_name, protocol_key, split_protocol_key},
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{ConfigPath, ListReader, Normalize, ReadContext, Result, extract};

const SH_BGP: &str = "show running-config | section router bgp";

static ROUTER_BGP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^router bgp (?<as>\d+)").expect("router bgp regex"));
static ADDRESS_FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ address-family (?<afi>\S+)(?: (?<safi>unicast|multicast))?(?: vrf (?<vrf>\S+))?")
        .expect("address-family regex")
});
static PEER_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ neighbor (?<group>\S+) peer-group\s*$").expect("peer-group regex")
});

/// One `address-family` block of the BGP section.
struct AddressFamily {
    name: String,
    vrf: Option<String>,
    body: String,
}

fn address_families(output: &str) -> Vec<AddressFamily> {
    extract::split_records(output, &ADDRESS_FAMILY)
        .into_iter()
        .filter_map(|record| {
            let caps = ADDRESS_FAMILY.captures(record.lines().next()?)?;
            Some(AddressFamily {
                name: afi_safi_name(&caps["afi"], caps.name("safi").map(|m| m.as_str()))?,
                vrf: caps.name("vrf").map(|m| m.as_str().to_string()),
                body: record.clone(),
            })
        })
        .collect()
}

/// Address families of the network instance `path` lies under.
fn instance_families(path: &ConfigPath, output: &str) -> Result<Vec<AddressFamily>> {
    let ni = path.require_key("network-instance")?;
    let vrf = (ni != DEFAULT_NETWORK).then_some(ni);
    Ok(address_families(output)
        .into_iter()
        .filter(|af| af.vrf.as_deref() == vrf)
        .collect())
}

fn is_bgp(path: &ConfigPath) -> Result<bool> {
    let key = path.require_key("protocol")?;
    Ok(matches!(split_protocol_key(key), Some((BGP, _))))
}

/// The single BGP process, listed in the default instance and in every VRF
/// with an address family.
pub struct BgpProtocolReader;

impl ListReader<Protocol> for BgpProtocolReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_BGP)?;
        if !ROUTER_BGP.is_match(output.lines().next().unwrap_or_default()) {
            return Ok(Vec::new());
        }
        let listed = path.require_key("network-instance")? == DEFAULT_NETWORK
            || !instance_families(path, &output)?.is_empty();
        Ok(if listed {
            vec![protocol_key(BGP, DEFAULT_NETWORK)]
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
        if let Some((BGP, name)) = split_protocol_key(path.require_key("protocol")?) {
            builder.identifier = BGP.to_string();
            builder.name = name.to_string();
        }
        Ok(())
    }
}

/// Peer groups. The default instance lists every declared group; a VRF lists
/// the groups used in its address families.
pub struct PeerGroupReader;

impl ListReader<PeerGroup> for PeerGroupReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_bgp(path)? {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_BGP)?;
        let groups = extract::extract_keys(&output, Normalize::None, &PEER_GROUP, "group");
        if path.require_key("network-instance")? == DEFAULT_NETWORK {
            return Ok(groups);
        }
        let families = instance_families(path, &output)?;
        let mut used = Vec::new();
        for group in groups {
            let pattern = compile(path, &format!(r"^\s+neighbor {}\s", regex::escape(&group)))?;
            if families.iter().any(|af| af.body.lines().any(|l| pattern.is_match(l))) {
                used.push(group);
            }
        }
        Ok(used)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut PeerGroup,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.peer_group_name = path.require_key("peer-group")?.to_string();
        Ok(())
    }
}

/// Address families a peer group has statements in.
pub struct PeerGroupAfiSafiReader;

impl PeerGroupAfiSafiReader {
    /// Address family names of `output` mentioning `group` in the instance
    /// of `path`.
    pub fn afi_safi_keys(path: &ConfigPath, output: &str, group: &str) -> Result<Vec<String>> {
        let pattern = compile(path, &format!(r"^\s+neighbor {}\s", regex::escape(group)))?;
        Ok(instance_families(path, output)?
            .into_iter()
            .filter(|af| af.body.lines().skip(1).any(|l| pattern.is_match(l)))
            .map(|af| af.name)
            .collect())
    }
}

impl ListReader<AfiSafi> for PeerGroupAfiSafiReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_bgp(path)? {
            return Ok(Vec::new());
        }
        let group = path.require_key("peer-group")?;
        let output = ctx.read(path, SH_BGP)?;
        Self::afi_safi_keys(path, &output, group)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AfiSafi,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.afi_safi_name = path.require_key("afi-safi")?.to_string();
        Ok(())
    }
}
