//! IronWare network instances.
//!
//! Pseudowires (`vll`) and VPLS domains live under `router mpls`, each as one
//! indented block:
//!
//! ```text
//! router mpls
//!  vll network 41
//!   vll-mtu 9100
//!   vll-peer 10.0.0.1
//!  vpls abcd 4444
//!   vpls-peer 8.8.8.8 7.7.7.7 6.6.6.6
//!   vlan 200
//!    untagged e 1/8
//! ```
//!
//! VRFs are top-level `vrf NAME` blocks. VLANs of the default instance are
//! top-level `vlan N` statements.

use crate::common::{
    DefaultInstanceReader, default_config_child, is_default_instance, numeric_key,
    reserved_default_writer,
};
use crate::model::{
    ConnectionPoint, ConnectionPoints, Endpoint, InstanceType, NetworkInstance,
    NetworkInstanceConfig, Vlan, VlanConfig,
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, Claim, CommandSequence, CompositeConfigReader, CompositeListReader,
    CompositeWriter, ConfigPath, ConfigReader, ContextClaim, Error, Field, Frame, Guarded,
    ListReader, Normalize, ReadContext, Result, WriteContext, Writer, ensure_unchanged, extract,
};

const SH_MPLS: &str = "show running-config | begin router mpls";
const SH_VRF: &str = "show running-config | begin vrf";
const SH_VLANS: &str = "show running-config | include ^vlan";

static MPLS_RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?<kind>vll|vpls) (?<name>\S+) (?<vcid>[0-9]+)").expect("mpls record regex")
});
static VRF_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^vrf (?<name>\S+)").expect("vrf record regex"));
static MTU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(vll|vpls)-mtu (?<mtu>[0-9]+)").expect("mtu regex"));
static PEERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(vll|vpls)-peer (?<peers>.+)").expect("peer regex"));
static VLAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*vlan (?<vlan>[0-9]+)").expect("vlan regex"));
static PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(untagged|tagged) (?<type>\S+) (?<port>\S+)").expect("port regex")
});
static DEFAULT_VLAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^vlan (?<vlan>[0-9]+)(?: name (?<name>\S+))?").expect("default vlan regex")
});
static RD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*rd (?<rd>\S+)").expect("rd regex"));

/// One `vll`/`vpls` block of the MPLS section.
struct MplsRecord {
    kind: InstanceType,
    name: String,
    vc_id: u32,
    body: String,
}

fn mpls_records(output: &str) -> Vec<MplsRecord> {
    extract::split_records(output, &MPLS_RECORD)
        .into_iter()
        .filter_map(|record| {
            let caps = MPLS_RECORD.captures(&record)?;
            let kind = if &caps["kind"] == "vll" {
                InstanceType::L2p2p
            } else {
                InstanceType::L2vsi
            };
            Some(MplsRecord {
                kind,
                name: caps["name"].to_string(),
                vc_id: caps["vcid"].parse().ok()?,
                body: record.clone(),
            })
        })
        .collect()
}

fn mpls_record(
    path: &ConfigPath,
    ctx: &ReadContext<'_>,
    kind: InstanceType,
) -> Result<Option<MplsRecord>> {
    let name = path.require_key("network-instance")?;
    let output = ctx.read(path, SH_MPLS)?;
    Ok(mpls_records(&output)
        .into_iter()
        .find(|r| r.kind == kind && r.name == name))
}

fn vrf_record(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Option<String>> {
    let name = path.require_key("network-instance")?;
    let output = ctx.read(path, SH_VRF)?;
    Ok(extract::split_records(&output, &VRF_RECORD)
        .into_iter()
        .find(|r| VRF_RECORD.captures(r).is_some_and(|c| &c["name"] == name)))
}

// ============================================================================
// Readers
// ============================================================================

/// Lists pseudowires (`vll`) or VPLS domains (`vpls`).
pub struct MplsInstanceReader {
    kind: InstanceType,
}

impl MplsInstanceReader {
    pub fn vll() -> Self {
        Self {
            kind: InstanceType::L2p2p,
        }
    }

    pub fn vpls() -> Self {
        Self {
            kind: InstanceType::L2vsi,
        }
    }
}

impl ListReader<NetworkInstance> for MplsInstanceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_MPLS)?;
        Ok(mpls_records(&output)
            .into_iter()
            .filter(|r| r.kind == self.kind)
            .map(|r| r.name)
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstance,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("network-instance")?.to_string();
        Ok(())
    }
}

impl ConfigReader<NetworkInstanceConfig> for MplsInstanceReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        if let Some(record) = mpls_record(path, ctx, self.kind)? {
            builder.name = record.name;
            builder.kind = record.kind;
            builder.mtu = extract::extract_parsed(&record.body, Normalize::None, &MTU, "mtu");
        }
        Ok(())
    }
}

pub struct VrfReader;

impl ListReader<NetworkInstance> for VrfReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_VRF)?;
        Ok(extract::extract_keys(&output, Normalize::None, &VRF_RECORD, "name"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstance,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("network-instance")?.to_string();
        Ok(())
    }
}

impl ConfigReader<NetworkInstanceConfig> for VrfReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        if let Some(record) = vrf_record(path, ctx)? {
            builder.name = path.require_key("network-instance")?.to_string();
            builder.kind = InstanceType::L3vrf;
            builder.route_distinguisher =
                extract::extract_value(&record, Normalize::None, &RD, "rd");
        }
        Ok(())
    }
}

/// Whether `reader` lists the instance `path` belongs to.
fn listed_by(
    reader: &dyn ListReader<NetworkInstance>,
    path: &ConfigPath,
    ctx: &ReadContext<'_>,
) -> Result<bool> {
    let name = path.require_key("network-instance")?;
    let list = ConfigPath::root().child("network-instance");
    Ok(reader.list_keys(&list, ctx)?.iter().any(|k| k == name))
}

/// Every instance kind, pseudowires first and the default instance last.
pub fn instance_list_reader() -> CompositeListReader<NetworkInstance> {
    CompositeListReader::new(vec![
        Box::new(MplsInstanceReader::vll()),
        Box::new(MplsInstanceReader::vpls()),
        Box::new(VrfReader),
        Box::new(DefaultInstanceReader),
    ])
}

pub fn instance_config_reader() -> CompositeConfigReader<NetworkInstanceConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(
            MplsInstanceReader::vll(),
            |path: &ConfigPath, ctx: &ReadContext<'_>| {
                listed_by(&MplsInstanceReader::vll(), path, ctx)
            },
        )),
        Box::new(Guarded::new(
            MplsInstanceReader::vpls(),
            |path: &ConfigPath, ctx: &ReadContext<'_>| {
                listed_by(&MplsInstanceReader::vpls(), path, ctx)
            },
        )),
        Box::new(Guarded::new(VrfReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            listed_by(&VrfReader, path, ctx)
        })),
        Box::new(default_config_child()),
    ])
}

/// Endpoints of a `vll`/`vpls` block.
///
/// Every peer address becomes a remote connection point carrying the block's
/// circuit id; every tagged or untagged port becomes a local one.
fn connection_points(record: &MplsRecord) -> Vec<ConnectionPoint> {
    let peers = extract::extract_all(&record.body, Normalize::CollapseWhitespace, &PEERS, |caps| {
        Some(
            caps["peers"]
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )
    })
    .into_iter()
    .flatten();
    let remotes = peers.map(|address| ConnectionPoint {
        connection_point_id: format!("remote-{address}"),
        endpoints: vec![Endpoint::Remote {
            address,
            vc_id: Some(record.vc_id),
        }],
    });

    let vlan = extract::extract_parsed(&record.body, Normalize::None, &VLAN, "vlan");
    let locals = extract::extract_all(&record.body, Normalize::None, &PORT, |caps| {
        Some(format!("{} {}", port_type(&caps["type"]), &caps["port"]))
    })
    .into_iter()
    .map(|interface| ConnectionPoint {
        connection_point_id: format!("local-{interface}"),
        endpoints: vec![Endpoint::Local { interface, vlan }],
    });

    remotes.chain(locals).collect()
}

/// Expand the abbreviated port type printed in VLAN membership lines.
fn port_type(abbreviation: &str) -> &str {
    match abbreviation {
        "e" | "eth" => "ethernet",
        "lg" => "lag",
        other => other,
    }
}

/// Remote peers and local ports of a pseudowire or VPLS domain.
pub struct ConnectionPointReader;

impl ConnectionPointReader {
    fn points(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<ConnectionPoint>> {
        let name = path.require_key("network-instance")?;
        let output = ctx.read(path, SH_MPLS)?;
        Ok(mpls_records(&output)
            .iter()
            .find(|r| r.name == name)
            .map(connection_points)
            .unwrap_or_default())
    }
}

impl ListReader<ConnectionPoint> for ConnectionPointReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(Self::points(path, ctx)?
            .into_iter()
            .map(|p| p.connection_point_id)
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut ConnectionPoint,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let id = path.require_key("connection-point")?;
        let found = Self::points(path, ctx)?
            .into_iter()
            .find(|p| p.connection_point_id == id);
        if let Some(point) = found {
            *builder = point;
        }
        Ok(())
    }
}

// ============================================================================
// VLANs
// ============================================================================

/// Top-level VLANs, all owned by the default instance.
pub struct DefaultVlanReader;

impl ListReader<Vlan> for DefaultVlanReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_default_instance(path) {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_VLANS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &DEFAULT_VLAN, "vlan"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Vlan,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.vlan_id = numeric_key(path, "vlan")?;
        Ok(())
    }
}

impl ConfigReader<VlanConfig> for DefaultVlanReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut VlanConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let vlan = path.require_key("vlan")?;
        let output = ctx.read(path, SH_VLANS)?;
        let found = extract::extract_first(&output, Normalize::None, &DEFAULT_VLAN, |caps| {
            (&caps["vlan"] == vlan).then(|| caps.name("name").map(|m| m.as_str().to_string()))
        });
        if let Some(name) = found {
            builder.vlan_id = numeric_key(path, "vlan")?;
            builder.name = name;
        }
        Ok(())
    }
}

/// VLAN of a `vll` or `vpls` block.
pub struct MplsVlanReader {
    kind: InstanceType,
}

impl MplsVlanReader {
    pub fn vll() -> Self {
        Self {
            kind: InstanceType::L2p2p,
        }
    }

    pub fn vpls() -> Self {
        Self {
            kind: InstanceType::L2vsi,
        }
    }

    fn vlans(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if is_default_instance(path) {
            return Ok(Vec::new());
        }
        Ok(mpls_record(path, ctx, self.kind)?
            .map(|record| extract::extract_keys(&record.body, Normalize::None, &VLAN, "vlan"))
            .unwrap_or_default())
    }
}

impl ListReader<Vlan> for MplsVlanReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        self.vlans(path, ctx)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Vlan,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.vlan_id = numeric_key(path, "vlan")?;
        Ok(())
    }
}

impl ConfigReader<VlanConfig> for MplsVlanReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut VlanConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let vlan = path.require_key("vlan")?;
        if self.vlans(path, ctx)?.iter().any(|v| v == vlan) {
            builder.vlan_id = numeric_key(path, "vlan")?;
        }
        Ok(())
    }
}

/// VLANs of the default instance, of pseudowires and of VPLS domains.
pub fn vlan_reader() -> CompositeListReader<Vlan> {
    CompositeListReader::new(vec![
        Box::new(DefaultVlanReader),
        Box::new(MplsVlanReader::vll()),
        Box::new(MplsVlanReader::vpls()),
    ])
}

/// Whether `reader` lists the VLAN `path` belongs to.
fn lists_vlan(
    reader: &dyn ListReader<Vlan>,
    path: &ConfigPath,
    ctx: &ReadContext<'_>,
) -> Result<bool> {
    let vlan = path.require_key("vlan")?;
    let list = path
        .cut_at("vlan")
        .map(|p| p.with_key_removed())
        .ok_or_else(|| Error::contract(path, "path is not below a vlan"))?;
    Ok(reader.list_keys(&list, ctx)?.iter().any(|k| k == vlan))
}

pub fn vlan_config_reader() -> CompositeConfigReader<VlanConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(DefaultVlanReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            lists_vlan(&DefaultVlanReader, path, ctx)
        })),
        Box::new(Guarded::new(MplsVlanReader::vll(), |path: &ConfigPath, ctx: &ReadContext<'_>| {
            lists_vlan(&MplsVlanReader::vll(), path, ctx)
        })),
        Box::new(Guarded::new(MplsVlanReader::vpls(), |path: &ConfigPath, ctx: &ReadContext<'_>| {
            lists_vlan(&MplsVlanReader::vpls(), path, ctx)
        })),
    ])
}

// ============================================================================
// Writers
// ============================================================================

fn mpls_frame() -> Frame {
    Frame::new(["configure terminal", "router mpls"], ["end"])
}

/// Circuit id of the instance at `path`, from its connection points.
fn vc_id(path: &ConfigPath, ctx: &WriteContext, deleting: bool) -> Result<u32> {
    let points_path = path
        .cut_at("network-instance")
        .map(|ni| ni.child("connection-points"))
        .ok_or_else(|| Error::contract(path, "path is not below a network instance"))?;
    let points: Option<ConnectionPoints> = if deleting {
        ctx.before(&points_path)?
    } else {
        ctx.after(&points_path)?
    };
    points.and_then(|p| p.vc_id()).ok_or_else(|| {
        Error::invalid(
            path,
            "circuit id unknown: no remote connection point with a vc-id in this transaction",
        )
    })
}

/// Writer for `vll` (point-to-point) and `vpls` (multipoint) instances.
pub struct MplsInstanceWriter {
    keyword: &'static str,
}

impl MplsInstanceWriter {
    pub fn vll() -> Self {
        Self { keyword: "vll" }
    }

    pub fn vpls() -> Self {
        Self { keyword: "vpls" }
    }

    fn frame(&self, name: &str, vc_id: u32) -> Frame {
        mpls_frame().enter(format!("{} {name} {vc_id}", self.keyword))
    }
}

impl Writer<NetworkInstanceConfig> for MplsInstanceWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &NetworkInstanceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let vc_id = vc_id(path, ctx, false)?;
        let keyword = self.keyword;
        Ok(BlockBuilder::new(self.frame(&after.name, vc_id))
            .opt(after.mtu.as_ref(), |mtu| format!("{keyword}-mtu {mtu}"))
            .finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &NetworkInstanceConfig,
        after: &NetworkInstanceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if !Field::between(before.mtu.as_ref(), after.mtu.as_ref()).is_changed() {
            return Ok(CommandSequence::empty());
        }
        let vc_id = vc_id(path, ctx, false)?;
        let keyword = self.keyword;
        Ok(BlockBuilder::new(self.frame(&after.name, vc_id))
            .set_or_no(
                before.mtu.as_ref(),
                after.mtu.as_ref(),
                |mtu| format!("{keyword}-mtu {mtu}"),
                |mtu| format!("no {keyword}-mtu {mtu}"),
            )
            .finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &NetworkInstanceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let vc_id = vc_id(path, ctx, true)?;
        Ok(BlockBuilder::new(mpls_frame())
            .line(format!("no {} {} {vc_id}", self.keyword, before.name))
            .finish())
    }
}

pub struct VrfWriter;

impl Writer<NetworkInstanceConfig> for VrfWriter {
    fn create(
        &self,
        _path: &ConfigPath,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(vrf_frame(&after.name))
            .opt(after.route_distinguisher.as_ref(), |rd| format!("rd {rd}"))
            .finish_always())
    }

    fn update(
        &self,
        _path: &ConfigPath,
        before: &NetworkInstanceConfig,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(vrf_frame(&after.name))
            .set_or_no(
                before.route_distinguisher.as_ref(),
                after.route_distinguisher.as_ref(),
                |rd| format!("rd {rd}"),
                |rd| format!("no rd {rd}"),
            )
            .finish())
    }

    fn delete(
        &self,
        _path: &ConfigPath,
        before: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(Frame::new(["configure terminal"], ["end"]))
            .line(format!("no vrf {}", before.name))
            .finish())
    }
}

fn vrf_frame(name: &str) -> Frame {
    Frame::new(["configure terminal".to_string(), format!("vrf {name}")], ["end"])
}

/// Dispatches instance configuration by instance type.
pub fn instance_config_writer() -> CompositeWriter<NetworkInstanceConfig> {
    CompositeWriter::new(vec![
        Box::new(Claim::new(MplsInstanceWriter::vll(), |_: &ConfigPath, c: &NetworkInstanceConfig| {
            c.kind == InstanceType::L2p2p
        })),
        Box::new(Claim::new(
            MplsInstanceWriter::vpls(),
            |_: &ConfigPath, c: &NetworkInstanceConfig| c.kind == InstanceType::L2vsi,
        )),
        Box::new(Claim::new(VrfWriter, |_: &ConfigPath, c: &NetworkInstanceConfig| {
            c.kind == InstanceType::L3vrf
        })),
        Box::new(reserved_default_writer()),
    ])
}

/// Writer for the peers and ports of a `vll` or `vpls` block.
///
/// A local endpoint with a VLAN is added as a tagged member of that VLAN; one
/// without is added untagged.
pub struct ConnectionPointsWriter {
    keyword: &'static str,
}

impl ConnectionPointsWriter {
    pub fn vll() -> Self {
        Self { keyword: "vll" }
    }

    pub fn vpls() -> Self {
        Self { keyword: "vpls" }
    }

    fn frame(&self, path: &ConfigPath, points: &ConnectionPoints) -> Result<Frame> {
        let name = path.require_key("network-instance")?;
        let vc_id = points.vc_id().ok_or_else(|| {
            Error::invalid(path, "circuit id unknown: no remote connection point with a vc-id")
        })?;
        Ok(mpls_frame().enter(format!("{} {name} {vc_id}", self.keyword)))
    }

    fn add(&self, endpoint: &Endpoint) -> Vec<String> {
        match endpoint {
            Endpoint::Remote { address, .. } => vec![format!("{}-peer {address}", self.keyword)],
            Endpoint::Local {
                interface,
                vlan: Some(vlan),
            } => vec![format!("vlan {vlan}"), format!("tagged {interface}"), "exit".to_string()],
            Endpoint::Local { interface, vlan: None } => vec![format!("untagged {interface}")],
        }
    }

    fn remove(&self, endpoint: &Endpoint) -> Vec<String> {
        match endpoint {
            Endpoint::Remote { address, .. } => vec![format!("no {}-peer {address}", self.keyword)],
            Endpoint::Local {
                interface,
                vlan: Some(vlan),
            } => vec![format!("vlan {vlan}"), format!("no tagged {interface}"), "exit".to_string()],
            Endpoint::Local { interface, vlan: None } => vec![format!("no untagged {interface}")],
        }
    }
}

fn endpoints(points: &ConnectionPoints) -> Vec<&Endpoint> {
    points
        .connection_point
        .iter()
        .flat_map(|p| &p.endpoints)
        .collect()
}

impl Writer<ConnectionPoints> for ConnectionPointsWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &ConnectionPoints,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let lines = endpoints(after).into_iter().flat_map(|e| self.add(e));
        Ok(BlockBuilder::new(self.frame(path, after)?).extend(lines).finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &ConnectionPoints,
        after: &ConnectionPoints,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "vc-id", &before.vc_id(), &after.vc_id())?;
        let (old, new) = (endpoints(before), endpoints(after));
        let removed = old.iter().filter(|e| !new.contains(e)).flat_map(|e| self.remove(e));
        let added = new.iter().filter(|e| !old.contains(e)).flat_map(|e| self.add(e));
        Ok(BlockBuilder::new(self.frame(path, after)?)
            .extend(removed.chain(added).collect::<Vec<_>>())
            .finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &ConnectionPoints,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let lines = endpoints(before).into_iter().flat_map(|e| self.remove(e));
        Ok(BlockBuilder::new(self.frame(path, before)?).extend(lines).finish())
    }
}

/// Type of the instance owning `path` once the transaction is applied.
fn instance_type(path: &ConfigPath, ctx: &WriteContext) -> Option<InstanceType> {
    let config = path.cut_at("network-instance")?.child("config");
    match ctx.after::<NetworkInstanceConfig>(&config) {
        Ok(found) => found.map(|c| c.kind),
        Err(e) => {
            log::warn!("cannot decode {config}: {e}");
            None
        }
    }
}

/// Dispatches connection points by the type of their instance.
pub fn connection_points_writer() -> CompositeWriter<ConnectionPoints> {
    CompositeWriter::new(vec![
        Box::new(ContextClaim::new(
            ConnectionPointsWriter::vll(),
            |path: &ConfigPath, _: &ConnectionPoints, ctx: &WriteContext| {
                instance_type(path, ctx) == Some(InstanceType::L2p2p)
            },
        )),
        Box::new(ContextClaim::new(
            ConnectionPointsWriter::vpls(),
            |path: &ConfigPath, _: &ConnectionPoints, ctx: &WriteContext| {
                instance_type(path, ctx) == Some(InstanceType::L2vsi)
            },
        )),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{ErrorKind, MockChannel, ReadCache, Snapshot};

    const MPLS: &str = "router mpls\n vll network 41\n  vll-mtu 9100\n  vll-peer 10.0.0.1\n\
        \x20vpls abcd 4444 \n  vpls-peer 8.8.8.8 7.7.7.7 6.6.6.6 \n  vlan 200 \n\
        \x20  untagged e 1/8 \n";

    fn ni(name: &str) -> ConfigPath {
        ConfigPath::root().keyed("network-instance", name)
    }

    fn context_with_vc(name: &str, vc_id: u32) -> WriteContext {
        let points = ConnectionPoints {
            connection_point: vec![ConnectionPoint {
                connection_point_id: "remote-10.0.0.1".into(),
                endpoints: vec![Endpoint::Remote {
                    address: "10.0.0.1".into(),
                    vc_id: Some(vc_id),
                }],
            }],
        };
        let path = ni(name).child("connection-points");
        let snapshot = Snapshot::from_data(&path, &points).unwrap();
        WriteContext::new()
            .with_before(path.clone(), snapshot.clone())
            .with_after(path, snapshot)
    }

    fn vll(mtu: Option<u16>) -> NetworkInstanceConfig {
        NetworkInstanceConfig {
            mtu,
            ..NetworkInstanceConfig::new("network", InstanceType::L2p2p)
        }
    }

    #[test]
    fn test_vll_mtu_set() {
        let ctx = context_with_vc("network", 41);
        let commands = instance_config_writer()
            .update(&ni("network").child("config"), &vll(None), &vll(Some(9100)), &ctx)
            .unwrap();
        assert_eq!(
            commands.to_text(),
            "configure terminal\nrouter mpls\nvll network 41\nvll-mtu 9100\nend\n"
        );
    }

    #[test]
    fn test_vll_mtu_unset_emits_only_no_form() {
        let ctx = context_with_vc("network", 41);
        let commands = instance_config_writer()
            .update(&ni("network").child("config"), &vll(Some(9100)), &vll(None), &ctx)
            .unwrap();
        assert_eq!(
            commands.to_text(),
            "configure terminal\nrouter mpls\nvll network 41\nno vll-mtu 9100\nend\n"
        );
    }

    #[test]
    fn test_vll_without_vc_id() {
        let err = instance_config_writer()
            .create(&ni("network").child("config"), &vll(None), &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_default_instance_reserved() {
        let config = NetworkInstanceConfig::new("default", InstanceType::DefaultInstance);
        let err = instance_config_writer()
            .delete(&ni("default").child("config"), &config, &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForbiddenLifecycleOperation);
    }

    #[test]
    fn test_vrf_rd_change() {
        let before = NetworkInstanceConfig {
            route_distinguisher: Some("1:1".into()),
            ..NetworkInstanceConfig::new("CUST", InstanceType::L3vrf)
        };
        let after = NetworkInstanceConfig {
            route_distinguisher: None,
            ..before.clone()
        };
        let commands = instance_config_writer()
            .update(&ni("CUST").child("config"), &before, &after, &WriteContext::new())
            .unwrap();
        assert_eq!(commands.to_text(), "configure terminal\nvrf CUST\nno rd 1:1\nend\n");
    }

    #[test]
    fn test_instance_keys_and_config() {
        let channel = MockChannel::new()
            .with_output(SH_MPLS, MPLS)
            .with_output(SH_VRF, "vrf CUST\n rd 65000:1\n");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let keys = instance_list_reader()
            .list_keys(&ConfigPath::root().child("network-instance"), &ctx)
            .unwrap();
        assert_eq!(keys, ["network", "abcd", "CUST", "default"]);

        let mut config = NetworkInstanceConfig::default();
        instance_config_reader()
            .populate(&ni("network").child("config"), &mut config, &ctx)
            .unwrap();
        assert_eq!(config.kind, InstanceType::L2p2p);
        assert_eq!(config.mtu, Some(9100));

        let mut config = NetworkInstanceConfig::default();
        instance_config_reader()
            .populate(&ni("CUST").child("config"), &mut config, &ctx)
            .unwrap();
        assert_eq!(config.kind, InstanceType::L3vrf);
        assert_eq!(config.route_distinguisher.as_deref(), Some("65000:1"));
    }

    #[test]
    fn test_vpls_connection_points() {
        let channel = MockChannel::new().with_output(SH_MPLS, MPLS);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let list = ni("abcd").child("connection-points").child("connection-point");

        let keys = ConnectionPointReader.list_keys(&list, &ctx).unwrap();
        assert_eq!(
            keys,
            ["remote-8.8.8.8", "remote-7.7.7.7", "remote-6.6.6.6", "local-ethernet 1/8"]
        );

        let mut local = ConnectionPoint::default();
        ConnectionPointReader
            .populate(&list.with_key("local-ethernet 1/8"), &mut local, &ctx)
            .unwrap();
        assert_eq!(
            local.endpoints,
            [Endpoint::Local {
                interface: "ethernet 1/8".into(),
                vlan: Some(200),
            }]
        );

        let mut remote = ConnectionPoint::default();
        ConnectionPointReader
            .populate(&list.with_key("remote-7.7.7.7"), &mut remote, &ctx)
            .unwrap();
        assert_eq!(remote.vc_id(), Some(4444));
    }

    fn points(vc_id: u32, peers: &[&str]) -> ConnectionPoints {
        ConnectionPoints {
            connection_point: peers
                .iter()
                .map(|address| ConnectionPoint {
                    connection_point_id: format!("remote-{address}"),
                    endpoints: vec![Endpoint::Remote {
                        address: (*address).into(),
                        vc_id: Some(vc_id),
                    }],
                })
                .collect(),
        }
    }

    fn instance_context(name: &str, kind: InstanceType) -> WriteContext {
        let path = ni(name).child("config");
        let snapshot = Snapshot::from_data(&path, &NetworkInstanceConfig::new(name, kind)).unwrap();
        WriteContext::new().with_before(path, snapshot)
    }

    #[test]
    fn test_peer_replaced() {
        let ctx = instance_context("network", InstanceType::L2p2p);
        let commands = connection_points_writer()
            .update(
                &ni("network").child("connection-points"),
                &points(41, &["10.0.0.1"]),
                &points(41, &["10.0.0.2"]),
                &ctx,
            )
            .unwrap();
        assert_eq!(
            commands.to_text(),
            "configure terminal\nrouter mpls\nvll network 41\nno vll-peer 10.0.0.1\n\
             vll-peer 10.0.0.2\nend\n"
        );
    }

    #[test]
    fn test_points_follow_instance_type() {
        let path = ni("CUST").child("connection-points");
        let err = connection_points_writer()
            .create(
                &path,
                &points(1, &["10.0.0.1"]),
                &instance_context("CUST", InstanceType::L3vrf),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);

        let err = connection_points_writer()
            .update(
                &ni("abcd").child("connection-points"),
                &points(4444, &["8.8.8.8"]),
                &points(4445, &["8.8.8.8"]),
                &instance_context("abcd", InstanceType::L2vsi),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableFieldChanged);
    }

    #[test]
    fn test_vlans_by_instance() {
        let channel = MockChannel::new()
            .with_output(SH_MPLS, MPLS)
            .with_output(
                SH_VLANS,
                "vlan 1 name DEFAULT-VLAN by port\nvlan 100 name mgmt by port\nvlan 200\n",
            );
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let keys = vlan_reader()
            .list_keys(&ni("default").child("vlans").child("vlan"), &ctx)
            .unwrap();
        assert_eq!(keys, ["1", "100", "200"]);
        let keys = vlan_reader()
            .list_keys(&ni("abcd").child("vlans").child("vlan"), &ctx)
            .unwrap();
        assert_eq!(keys, ["200"]);
        let keys = vlan_reader()
            .list_keys(&ni("network").child("vlans").child("vlan"), &ctx)
            .unwrap();
        assert!(keys.is_empty());

        let mut config = VlanConfig::default();
        vlan_config_reader()
            .populate(
                &ni("default").child("vlans").keyed("vlan", "100").child("config"),
                &mut config,
                &ctx,
            )
            .unwrap();
        assert_eq!(
            config,
            VlanConfig {
                vlan_id: 100,
                name: Some("mgmt".into()),
            }
        );

        let mut config = VlanConfig::default();
        vlan_config_reader()
            .populate(
                &ni("abcd").child("vlans").keyed("vlan", "200").child("config"),
                &mut config,
                &ctx,
            )
            .unwrap();
        assert_eq!(config, VlanConfig { vlan_id: 200, name: None });
    }
}
