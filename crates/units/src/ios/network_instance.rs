//! IOS VRFs (`ip vrf NAME`) and the default instance.

use crate::common::{default_config_child, reserved_default_writer};
use crate::model::{DEFAULT_NETWORK, InstanceType, NetworkInstance, NetworkInstanceConfig};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, Claim, CommandSequence, CompositeConfigReader, CompositeWriter, ConfigPath,
    ConfigReader, Field, Frame, Guarded, ListReader, Normalize, ReadContext, Result, WriteContext,
    Writer, extract,
};

pub(crate) const SH_VRFS: &str = "show running-config | include ^ip vrf";
const SH_VRF_CONFIG: &str = "show running-config | include ^ip vrf|^ rd";

static VRF_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ip vrf (?<id>\S+).*").expect("vrf id regex"));
static VRF_RECORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ip vrf ").expect("vrf record regex"));
static RD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\brd (?<rd>\S+)").expect("rd regex"));

/// VRF names in configuration order, with the default instance last.
pub struct VrfReader;

impl ListReader<NetworkInstance> for VrfReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_VRFS)?;
        let mut keys = extract::extract_keys(&output, Normalize::None, &VRF_ID, "id");
        keys.retain(|k| k != DEFAULT_NETWORK);
        keys.push(DEFAULT_NETWORK.to_string());
        Ok(keys)
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

/// Route distinguisher of a named VRF.
///
/// `rd` is printed on the line after `ip vrf`, so records are realigned
/// before matching.
pub struct VrfConfigReader;

impl ConfigReader<NetworkInstanceConfig> for VrfConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("network-instance")?;
        let output = ctx.read(path, SH_VRF_CONFIG)?;
        let realigned = extract::realign(&output, &VRF_RECORD);
        let Some(record) = realigned
            .lines()
            .find(|line| line.split_whitespace().nth(2) == Some(name))
        else {
            return Ok(());
        };
        builder.name = name.to_string();
        builder.kind = InstanceType::L3vrf;
        builder.route_distinguisher = extract::extract_value(record, Normalize::None, &RD, "rd");
        Ok(())
    }
}

pub fn vrf_config_reader() -> CompositeConfigReader<NetworkInstanceConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(VrfConfigReader, |path: &ConfigPath, _: &ReadContext<'_>| {
            Ok(path.first_key_of("network-instance") != Some(DEFAULT_NETWORK))
        })),
        Box::new(default_config_child()),
    ])
}

fn vrf_frame(name: &str) -> Frame {
    Frame::new(["configure terminal".to_string(), format!("ip vrf {name}")], ["end"])
}

/// Writer for L3 VRFs.
///
/// IOS refuses to overwrite a route distinguisher in place, so a changed rd
/// is removed before the new one is set.
pub struct VrfConfigWriter;

impl Writer<NetworkInstanceConfig> for VrfConfigWriter {
    fn create(
        &self,
        _path: &ConfigPath,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(vrf_frame(&after.name))
            .opt(after.route_distinguisher.as_ref(), |rd| format!("rd {rd}"))
            .opt(after.description.as_ref(), |d| format!("description {d}"))
            .finish_always())
    }

    fn update(
        &self,
        _path: &ConfigPath,
        before: &NetworkInstanceConfig,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let rd = match Field::between(
            before.route_distinguisher.as_ref(),
            after.route_distinguisher.as_ref(),
        ) {
            Field::Unchanged => Vec::new(),
            Field::Set(new) => vec![format!("rd {new}")],
            Field::Unset(old) => vec![format!("no rd {old}")],
            Field::Changed { old, new } => vec![format!("no rd {old}"), format!("rd {new}")],
        };
        Ok(BlockBuilder::new(vrf_frame(&after.name))
            .extend(rd)
            .set_or_no(
                before.description.as_ref(),
                after.description.as_ref(),
                |d| format!("description {d}"),
                |_| "no description".to_string(),
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
            .line(format!("no ip vrf {}", before.name))
            .finish())
    }
}

pub fn vrf_config_writer() -> CompositeWriter<NetworkInstanceConfig> {
    CompositeWriter::new(vec![
        Box::new(Claim::new(VrfConfigWriter, |_: &ConfigPath, c: &NetworkInstanceConfig| {
            c.kind == InstanceType::L3vrf
        })),
        Box::new(reserved_default_writer()),
    ])
}
