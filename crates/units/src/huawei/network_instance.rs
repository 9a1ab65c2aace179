//! VPN instances (`ip vpn-instance NAME`) and the default instance.

use crate::common::{default_config_child, is_default_instance, reserved_default_writer};
use crate::model::{DEFAULT_NETWORK, InstanceType, NetworkInstance, NetworkInstanceConfig};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, Claim, CommandSequence, CompositeConfigReader, CompositeWriter, ConfigPath,
    ConfigReader, Field, Frame, Guarded, ListReader, Normalize, ReadContext, Result, WriteContext,
    Writer, extract,
};

const SH_INSTANCES: &str = "display current-configuration | include ^ip vpn-instance";
const SH_INSTANCE_CONFIG: &str = "display current-configuration configuration vpn-instance";

static INSTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ip vpn-instance (?<name>\S+)").expect("vpn-instance regex"));
static RD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*route-distinguisher (?<rd>\S+)").expect("rd regex"));
static DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*description (?<text>.+)$").expect("description regex"));

/// VPN instances followed by the default instance.
pub struct VpnInstanceReader;

impl ListReader<NetworkInstance> for VpnInstanceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_INSTANCES)?;
        let mut keys = extract::extract_keys(&output, Normalize::None, &INSTANCE, "name");
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

pub struct VpnInstanceConfigReader;

impl ConfigReader<NetworkInstanceConfig> for VpnInstanceConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("network-instance")?;
        let output = ctx.read(path, SH_INSTANCE_CONFIG)?;
        let named = |record: &String| {
            extract::extract_value(record, Normalize::None, &INSTANCE, "name").as_deref()
                == Some(name)
        };
        let Some(record) = extract::split_records(&output, &INSTANCE).into_iter().find(named)
        else {
            return Ok(());
        };
        builder.name = name.to_string();
        builder.kind = InstanceType::L3vrf;
        builder.route_distinguisher = extract::extract_value(&record, Normalize::None, &RD, "rd");
        builder.description =
            extract::extract_value(&record, Normalize::None, &DESCRIPTION, "text");
        Ok(())
    }
}

pub fn instance_config_reader() -> CompositeConfigReader<NetworkInstanceConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(VpnInstanceConfigReader, |path: &ConfigPath, _: &ReadContext<'_>| {
            Ok(!is_default_instance(path))
        })),
        Box::new(default_config_child()),
    ])
}

fn instance_frame(name: &str) -> Frame {
    Frame::new(
        ["system-view".to_string(), format!("ip vpn-instance {name}")],
        ["commit", "return"],
    )
}

/// Lines of the `ipv4-family` view carrying the route distinguisher.
fn rd_lines(before: Option<&String>, after: Option<&String>) -> Vec<String> {
    let body = match Field::between(before, after) {
        Field::Unchanged => return Vec::new(),
        Field::Set(new) => vec![format!("route-distinguisher {new}")],
        Field::Unset(old) => vec![format!("undo route-distinguisher {old}")],
        Field::Changed { old, new } => vec![
            format!("undo route-distinguisher {old}"),
            format!("route-distinguisher {new}"),
        ],
    };
    std::iter::once("ipv4-family".to_string())
        .chain(body)
        .chain(std::iter::once("quit".to_string()))
        .collect()
}

/// Writer for L3 VPN instances.
pub struct VpnInstanceWriter;

impl Writer<NetworkInstanceConfig> for VpnInstanceWriter {
    fn create(
        &self,
        _path: &ConfigPath,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(instance_frame(&after.name))
            .opt(after.description.as_ref(), |d| format!("description {d}"))
            .extend(rd_lines(None, after.route_distinguisher.as_ref()))
            .finish_always())
    }

    fn update(
        &self,
        _path: &ConfigPath,
        before: &NetworkInstanceConfig,
        after: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(instance_frame(&after.name))
            .set_or_no(
                before.description.as_ref(),
                after.description.as_ref(),
                |d| format!("description {d}"),
                |_| "undo description".to_string(),
            )
            .extend(rd_lines(
                before.route_distinguisher.as_ref(),
                after.route_distinguisher.as_ref(),
            ))
            .finish())
    }

    fn delete(
        &self,
        _path: &ConfigPath,
        before: &NetworkInstanceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(Frame::new(["system-view"], ["commit", "return"]))
            .line(format!("undo ip vpn-instance {}", before.name))
            .finish())
    }
}

pub fn instance_config_writer() -> CompositeWriter<NetworkInstanceConfig> {
    CompositeWriter::new(vec![
        Box::new(Claim::new(VpnInstanceWriter, |_: &ConfigPath, c: &NetworkInstanceConfig| {
            c.kind == InstanceType::L3vrf
        })),
        Box::new(reserved_default_writer()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{MockChannel, ReadCache};

    fn config_path(name: &str) -> ConfigPath {
        ConfigPath::root().keyed("network-instance", name).child("config")
    }

    fn vrf(rd: Option<&str>) -> NetworkInstanceConfig {
        NetworkInstanceConfig {
            route_distinguisher: rd.map(Into::into),
            ..NetworkInstanceConfig::new("CUST", InstanceType::L3vrf)
        }
    }

    #[test]
    fn test_keys_default_last() {
        let channel = MockChannel::new()
            .with_output(SH_INSTANCES, "ip vpn-instance CUST\nip vpn-instance MGMT\n");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let keys = VpnInstanceReader
            .list_keys(&ConfigPath::root().child("network-instance"), &ctx)
            .unwrap();
        assert_eq!(keys, ["CUST", "MGMT", "default"]);
    }

    #[test]
    fn test_read_config() {
        let channel = MockChannel::new().with_output(
            SH_INSTANCE_CONFIG,
            "#\nip vpn-instance MGMT\n ipv4-family\n#\nip vpn-instance CUST\n\
             \x20description customer one\n ipv4-family\n  route-distinguisher 100:1\n#\n",
        );
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let mut config = NetworkInstanceConfig::default();
        instance_config_reader()
            .populate(&config_path("CUST"), &mut config, &ctx)
            .unwrap();
        assert_eq!(config.kind, InstanceType::L3vrf);
        assert_eq!(config.route_distinguisher.as_deref(), Some("100:1"));
        assert_eq!(config.description.as_deref(), Some("customer one"));
    }

    #[test]
    fn test_create_with_rd() {
        let text = instance_config_writer()
            .create(&config_path("CUST"), &vrf(Some("100:1")), &WriteContext::new())
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nip vpn-instance CUST\nipv4-family\nroute-distinguisher 100:1\nquit\n\
             commit\nreturn\n"
        );
    }

    #[test]
    fn test_rd_change_undoes_old() {
        let text = instance_config_writer()
            .update(
                &config_path("CUST"),
                &vrf(Some("100:1")),
                &vrf(Some("100:2")),
                &WriteContext::new(),
            )
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "system-view\nip vpn-instance CUST\nipv4-family\nundo route-distinguisher 100:1\n\
             route-distinguisher 100:2\nquit\ncommit\nreturn\n"
        );
    }
}
