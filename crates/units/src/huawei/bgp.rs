//! VRP BGP: process, address families and neighbors.
//!
//! VPN instances are configured inside the process as
//! `ipv4-family vpn-instance NAME`, so the instance has to exist before its
//! BGP view, and address families before the peers enabled in them.

use crate::model::{
    AfiSafiConfig, BgpGlobalConfig, BgpNeighbor, DEFAULT_NETWORK,
    routing::{BGP, split_protocol_key},
};
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, Error, Frame, Result, WriteContext, Writer,
    ensure_unchanged,
};

/// VPN instance of the path, `None` for the public network.
fn vpn_instance(path: &ConfigPath) -> Result<Option<&str>> {
    let key = path.require_key("protocol")?;
    if !matches!(split_protocol_key(key), Some((BGP, _))) {
        return Err(Error::invalid(path, format!("'{key}' is not a BGP protocol")));
    }
    let ni = path.require_key("network-instance")?;
    Ok((ni != DEFAULT_NETWORK).then_some(ni))
}

fn global_config(path: &ConfigPath) -> Result<ConfigPath> {
    path.cut_at("protocol")
        .map(|protocol| protocol.child("bgp").child("global").child("config"))
        .ok_or_else(|| Error::contract(path, "BGP node outside a protocol"))
}

/// AS number of the process owning `path`, from the global config of the
/// same transaction.
fn process_as(path: &ConfigPath, ctx: &WriteContext, deleting: bool) -> Result<Option<u32>> {
    let global = global_config(path)?;
    let config = if deleting {
        ctx.before::<BgpGlobalConfig>(&global)?
    } else {
        ctx.after::<BgpGlobalConfig>(&global)?
    };
    Ok(config.map(|c| c.as_number))
}

fn require_as(path: &ConfigPath, ctx: &WriteContext) -> Result<u32> {
    process_as(path, ctx, false)?
        .ok_or_else(|| Error::invalid(path, "BGP process is not configured"))
}

/// `system-view`, `bgp AS` and for VPN instances their family view.
fn bgp_frame(as_number: u32, instance: Option<&str>) -> Frame {
    let frame = Frame::new(
        ["system-view".to_string(), format!("bgp {as_number}")],
        ["commit", "return"],
    );
    match instance {
        Some(name) => frame.enter(format!("ipv4-family vpn-instance {name}")),
        None => frame,
    }
}

// ============================================================================
// Global
// ============================================================================

pub struct GlobalConfigWriter;

impl GlobalConfigWriter {
    fn router_id(
        builder: BlockBuilder,
        before: Option<&BgpGlobalConfig>,
        after: &BgpGlobalConfig,
    ) -> BlockBuilder {
        builder.set_or_no(
            before.and_then(|b| b.router_id.as_ref()),
            after.router_id.as_ref(),
            |id| format!("router-id {id}"),
            |_| "undo router-id".to_string(),
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
        let frame = bgp_frame(after.as_number, vpn_instance(path)?);
        Ok(Self::router_id(BlockBuilder::new(frame), None, after).finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &BgpGlobalConfig,
        after: &BgpGlobalConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "as", &before.as_number, &after.as_number)?;
        let frame = bgp_frame(after.as_number, vpn_instance(path)?);
        Ok(Self::router_id(BlockBuilder::new(frame), Some(before), after).finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &BgpGlobalConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(match vpn_instance(path)? {
            None => BlockBuilder::new(Frame::new(["system-view"], ["commit", "return"]))
                .line(format!("undo bgp {}", before.as_number))
                .finish(),
            Some(name) => BlockBuilder::new(bgp_frame(before.as_number, None))
                .line(format!("undo ipv4-family vpn-instance {name}"))
                .finish(),
        })
    }
}

// ============================================================================
// Address families
// ============================================================================

/// VRP family view of an address family name.
fn family_view(path: &ConfigPath, name: &str) -> Result<&'static str> {
    match name {
        "ipv4-unicast" => Ok("ipv4-family unicast"),
        "ipv6-unicast" => Ok("ipv6-family unicast"),
        "l3vpn-ipv4-unicast" => Ok("ipv4-family vpnv4"),
        "l2vpn-evpn" => Ok("l2vpn-family evpn"),
        other => Err(Error::unsupported_type(
            path,
            format!("address family {other} is not supported"),
        )),
    }
}

/// Address families of the public network process.
///
/// A VPN instance has exactly one family, its own view, which exists with
/// the instance's global config.
pub struct AfiSafiWriter;

impl Writer<AfiSafiConfig> for AfiSafiWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &AfiSafiConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if vpn_instance(path)?.is_some() || after.enabled == Some(false) {
            return Ok(CommandSequence::empty());
        }
        let as_number = require_as(path, ctx)?;
        Ok(BlockBuilder::new(bgp_frame(as_number, None))
            .line(family_view(path, &after.afi_safi_name)?)
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &AfiSafiConfig,
        after: &AfiSafiConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        match (before.enabled != Some(false), after.enabled != Some(false)) {
            (false, true) => self.create(path, after, ctx),
            (true, false) => self.delete(path, before, ctx),
            _ => Ok(CommandSequence::empty()),
        }
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &AfiSafiConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if vpn_instance(path)?.is_some() {
            return Ok(CommandSequence::empty());
        }
        let Some(as_number) = process_as(path, ctx, true)? else {
            return Ok(CommandSequence::empty());
        };
        Ok(BlockBuilder::new(bgp_frame(as_number, None))
            .line(format!("undo {}", family_view(path, &before.afi_safi_name)?))
            .finish())
    }
}

// ============================================================================
// Neighbors
// ============================================================================

/// Whole neighbor subtree: session attributes and enabled families.
///
/// In the public network each family is enabled in its own view; peers of
/// a VPN instance live in the instance view and need no enabling.
pub struct NeighborWriter;

impl NeighborWriter {
    /// Family views enabling (or undoing) the peer for families in `names`
    /// but not in `other`.
    fn families(
        path: &ConfigPath,
        address: &str,
        names: &[String],
        other: &[String],
        undo: bool,
    ) -> Result<Vec<String>> {
        let prefix = if undo { "undo " } else { "" };
        let mut lines = Vec::new();
        for name in names.iter().filter(|n| !other.contains(n)) {
            lines.push(family_view(path, name)?.to_string());
            lines.push(format!("{prefix}peer {address} enable"));
            lines.push("quit".to_string());
        }
        Ok(lines)
    }

    fn write(
        path: &ConfigPath,
        before: Option<&BgpNeighbor>,
        after: &BgpNeighbor,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let instance = vpn_instance(path)?;
        let as_number = require_as(path, ctx)?;
        let address = &after.neighbor_address;

        let peer_as = match (before.and_then(|b| b.peer_as), after.peer_as) {
            (_, None) => return Err(Error::invalid(path, "peer-as is required for a BGP neighbor")),
            (Some(old), Some(new)) => {
                ensure_unchanged(path, "peer-as", &old, &new)?;
                None
            }
            (None, Some(new)) => Some(new),
        };

        let (enabled, disabled) = if instance.is_some() {
            (Vec::new(), Vec::new())
        } else {
            let old = before.map(|b| b.afi_safis.as_slice()).unwrap_or_default();
            (
                Self::families(path, address, &after.afi_safis, old, false)?,
                Self::families(path, address, old, &after.afi_safis, true)?,
            )
        };

        Ok(BlockBuilder::new(bgp_frame(as_number, instance))
            .opt(peer_as.as_ref(), |asn| format!("peer {address} as-number {asn}"))
            .set_or_no(
                before.and_then(|b| b.description.as_ref()),
                after.description.as_ref(),
                |d| format!("peer {address} description {d}"),
                |_| format!("undo peer {address} description"),
            )
            .set_or_no(
                before.and_then(|b| b.local_address.as_ref()),
                after.local_address.as_ref(),
                |local| format!("peer {address} connect-interface {local}"),
                |_| format!("undo peer {address} connect-interface"),
            )
            .extend(disabled)
            .extend(enabled)
            .finish())
    }
}

impl Writer<BgpNeighbor> for NeighborWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &BgpNeighbor,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Self::write(path, None, after, ctx)
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &BgpNeighbor,
        after: &BgpNeighbor,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Self::write(path, Some(before), after, ctx)
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &BgpNeighbor,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let instance = vpn_instance(path)?;
        let Some(as_number) = process_as(path, ctx, true)? else {
            return Ok(CommandSequence::empty());
        };
        Ok(BlockBuilder::new(bgp_frame(as_number, instance))
            .line(format!("undo peer {}", before.neighbor_address))
            .finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{ErrorKind, Snapshot};

    fn protocol(ni: &str) -> ConfigPath {
        ConfigPath::root()
            .keyed("network-instance", ni)
            .child("protocols")
            .keyed("protocol", "bgp default")
            .child("bgp")
    }

    fn neighbor_path(ni: &str) -> ConfigPath {
        protocol(ni).child("neighbors").keyed("neighbor", "10.0.0.2")
    }

    fn ctx(ni: &str) -> WriteContext {
        let path = protocol(ni).child("global").child("config");
        let config = BgpGlobalConfig {
            as_number: 100,
            router_id: None,
        };
        let snapshot = Snapshot::from_data(&path, &config).unwrap();
        WriteContext::new()
            .with_before(path.clone(), snapshot.clone())
            .with_after(path, snapshot)
    }

    fn neighbor(afi_safis: &[&str]) -> BgpNeighbor {
        BgpNeighbor {
            neighbor_address: "10.0.0.2".into(),
            peer_as: Some(200),
            description: Some("upstream".into()),
            local_address: None,
            afi_safis: afi_safis.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_create_process_in_vpn_instance() {
        let config = BgpGlobalConfig {
            as_number: 100,
            router_id: Some("1.1.1.1".into()),
        };
        let text = GlobalConfigWriter
            .create(
                &protocol("CUST").child("global").child("config"),
                &config,
                &WriteContext::new(),
            )
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nbgp 100\nipv4-family vpn-instance CUST\nrouter-id 1.1.1.1\ncommit\n\
             return\n"
        );
    }

    #[test]
    fn test_family_needs_process() {
        let path = protocol("default")
            .child("global")
            .child("afi-safis")
            .keyed("afi-safi", "ipv4-unicast")
            .child("config");
        let family = AfiSafiConfig {
            afi_safi_name: "ipv4-unicast".into(),
            enabled: None,
        };
        assert_eq!(
            AfiSafiWriter.create(&path, &family, &ctx("default")).unwrap().to_text(),
            "system-view\nbgp 100\nipv4-family unicast\ncommit\nreturn\n"
        );
        assert_eq!(
            AfiSafiWriter
                .create(&path, &family, &WriteContext::new())
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidData
        );
    }

    #[test]
    fn test_create_neighbor() {
        let text = NeighborWriter
            .create(&neighbor_path("default"), &neighbor(&["ipv4-unicast"]), &ctx("default"))
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nbgp 100\npeer 10.0.0.2 as-number 200\n\
             peer 10.0.0.2 description upstream\nipv4-family unicast\npeer 10.0.0.2 enable\nquit\n\
             commit\nreturn\n"
        );
    }

    #[test]
    fn test_neighbor_family_switch() {
        let text = NeighborWriter
            .update(
                &neighbor_path("default"),
                &neighbor(&["ipv4-unicast"]),
                &neighbor(&["l3vpn-ipv4-unicast"]),
                &ctx("default"),
            )
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nbgp 100\nipv4-family unicast\nundo peer 10.0.0.2 enable\nquit\n\
             ipv4-family vpnv4\npeer 10.0.0.2 enable\nquit\ncommit\nreturn\n"
        );
    }

    #[test]
    fn test_neighbor_in_vpn_instance() {
        let text = NeighborWriter
            .create(&neighbor_path("CUST"), &neighbor(&["ipv4-unicast"]), &ctx("CUST"))
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nbgp 100\nipv4-family vpn-instance CUST\npeer 10.0.0.2 as-number 200\n\
             peer 10.0.0.2 description upstream\ncommit\nreturn\n"
        );
    }

    #[test]
    fn test_peer_as_immutable() {
        let mut moved = neighbor(&[]);
        moved.peer_as = Some(300);
        let err = NeighborWriter
            .update(&neighbor_path("default"), &neighbor(&[]), &moved, &ctx("default"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableFieldChanged);
    }

    #[test]
    fn test_delete_neighbor() {
        assert_eq!(
            NeighborWriter
                .delete(&neighbor_path("default"), &neighbor(&[]), &ctx("default"))
                .unwrap()
                .to_text(),
            "system-view\nbgp 100\nundo peer 10.0.0.2\ncommit\nreturn\n"
        );
    }
}
