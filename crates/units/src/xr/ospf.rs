//! OSPF processes, max-metric timers and per-area interface cost.

use crate::common::is_default_instance;
use crate::model::{
    AreaInterface, AreaInterfaceConfig, MaxMetricConfig, MaxMetricInclude, OspfArea, Protocol,
    routing::{OSPF, protocol_key, split_protocol_key},
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, ConfigReader, Error, Frame, ListReader, Normalize,
    ReadContext, Result, WriteContext, Writer, extract,
};

const SH_OSPF: &str = "show running-config router ospf | include ^router ospf";
const AREA_FILTER: &str = r#"utility egrep "^ area|^  interface |^   cost""#;

static ROUTER_OSPF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^router ospf (?<id>\S+)").expect("router ospf regex"));
static MAX_METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*max-metric router-lsa(?: on-startup (?<timeout>\d+))?(?<options>.*)$")
        .expect("max-metric regex")
});
static AREA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ area ").expect("area regex"));
static AREA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^area (?<area>\S+)").expect("area id regex"));
static COST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcost (?<cost>\d+)").expect("cost regex"));

/// OSPF process name of a `protocol[ospf NAME]` path.
fn process_name(path: &ConfigPath) -> Result<&str> {
    let key = path.require_key("protocol")?;
    match split_protocol_key(key) {
        Some((OSPF, name)) => Ok(name),
        _ => Err(Error::invalid(path, format!("'{key}' is not an OSPF protocol"))),
    }
}

fn is_ospf(path: &ConfigPath) -> Result<bool> {
    let key = path.require_key("protocol")?;
    Ok(matches!(split_protocol_key(key), Some((OSPF, _))))
}

/// `router ospf` processes of the global routing table.
pub struct OspfProtocolReader;

impl ListReader<Protocol> for OspfProtocolReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_default_instance(path) {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_OSPF)?;
        Ok(extract::extract_keys(&output, Normalize::None, &ROUTER_OSPF, "id")
            .iter()
            .map(|id| protocol_key(OSPF, id))
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Protocol,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.identifier = OSPF.to_string();
        builder.name = process_name(path)?.to_string();
        Ok(())
    }
}

// ============================================================================
// Max metric
// ============================================================================

pub struct MaxMetricReader;

impl ConfigReader<MaxMetricConfig> for MaxMetricReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut MaxMetricConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        if !is_ospf(path)? {
            return Ok(());
        }
        let name = process_name(path)?;
        let command = format!("show running-config router ospf {name} | include max-metric");
        let output = ctx.read(path, &command)?;
        if let Some(config) = extract::extract_first(&output, Normalize::None, &MAX_METRIC, |caps| {
            Some(MaxMetricConfig {
                set: Some(true),
                timeout: caps.name("timeout").and_then(|m| m.as_str().parse().ok()),
                include: caps["options"]
                    .split_whitespace()
                    .filter_map(MaxMetricInclude::from_keyword)
                    .collect(),
            })
        }) {
            *builder = config;
        }
        Ok(())
    }
}

/// `max-metric router-lsa` arguments, e.g. `on-startup 60 include-stub`.
fn max_metric_arguments(config: &MaxMetricConfig) -> String {
    let mut words = vec!["max-metric router-lsa".to_string()];
    if let Some(timeout) = config.timeout {
        words.push(format!("on-startup {timeout}"));
    }
    words.extend(config.include.iter().map(|i| i.keyword().to_string()));
    words.join(" ")
}

pub struct MaxMetricWriter;

impl MaxMetricWriter {
    fn frame(path: &ConfigPath) -> Result<Frame> {
        Ok(Frame::new([format!("router ospf {}", process_name(path)?)], ["exit"]))
    }
}

impl Writer<MaxMetricConfig> for MaxMetricWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &MaxMetricConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if after.set == Some(false) {
            return Ok(CommandSequence::empty());
        }
        Ok(BlockBuilder::new(Self::frame(path)?)
            .line(max_metric_arguments(after))
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &MaxMetricConfig,
        after: &MaxMetricConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if after.set == Some(false) {
            return self.delete(path, before, ctx);
        }
        self.create(path, after, ctx)
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &MaxMetricConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if before.set == Some(false) {
            return Ok(CommandSequence::empty());
        }
        Ok(BlockBuilder::new(Self::frame(path)?)
            .line(format!("no {}", max_metric_arguments(before)))
            .finish())
    }
}

// ============================================================================
// Areas
// ============================================================================

/// One record per area: `area 0 interface Loopback0 interface Gi0/0/0/0 cost 10`.
fn area_records(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
    if !is_ospf(path)? {
        return Ok(Vec::new());
    }
    let name = process_name(path)?;
    let command = format!("do show running-config router ospf {name} | {AREA_FILTER}");
    let output = ctx.read(path, &command)?;
    Ok(extract::realign(&output, &AREA).lines().map(str::to_string).collect())
}

fn area_record(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Option<String>> {
    let area = path.require_key("area")?;
    Ok(area_records(path, ctx)?.into_iter().find(|record| {
        extract::extract_value(record, Normalize::None, &AREA_ID, "area").as_deref() == Some(area)
    }))
}

/// `(interface, rest of the interface block)` pairs of one area record.
fn area_interfaces(record: &str) -> Vec<(&str, &str)> {
    record
        .split(" interface ")
        .skip(1)
        .filter_map(|block| {
            let (name, rest) = block.split_once(' ').unwrap_or((block, ""));
            (!name.is_empty()).then_some((name, rest))
        })
        .collect()
}

pub struct AreaReader;

impl ListReader<OspfArea> for AreaReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(area_records(path, ctx)?
            .iter()
            .filter_map(|record| extract::extract_value(record, Normalize::None, &AREA_ID, "area"))
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut OspfArea,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.identifier = path.require_key("area")?.to_string();
        Ok(())
    }
}

pub struct AreaInterfaceReader;

impl ListReader<AreaInterface> for AreaInterfaceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(area_record(path, ctx)?
            .map(|record| {
                area_interfaces(&record)
                    .into_iter()
                    .map(|(name, _)| name.to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AreaInterface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.id = path.require_key("interface")?.to_string();
        Ok(())
    }
}

/// Cost of one interface inside an area block.
pub struct AreaInterfaceConfigReader;

impl ConfigReader<AreaInterfaceConfig> for AreaInterfaceConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AreaInterfaceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let interface = path.require_key("interface")?;
        let Some(record) = area_record(path, ctx)? else {
            return Ok(());
        };
        let found = area_interfaces(&record)
            .into_iter()
            .find(|(name, _)| *name == interface);
        if let Some((_, rest)) = found {
            builder.id = interface.to_string();
            builder.metric = extract::extract_parsed(rest, Normalize::None, &COST, "cost");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{MockChannel, ReadCache};

    const AREAS_COMMAND: &str =
        r#"do show running-config router ospf 100 | utility egrep "^ area|^  interface |^   cost""#;
    const AREAS: &str = " area 0\n  interface Loopback0\n  interface GigabitEthernet0/0/0/0\n\
        \x20  cost 10\n area 0.0.0.1\n  interface GigabitEthernet0/0/0/1\n   cost 20\n\
        \x20 interface GigabitEthernet0/0/0/10\n";

    fn protocol(key: &str) -> ConfigPath {
        ConfigPath::root()
            .keyed("network-instance", "default")
            .child("protocols")
            .keyed("protocol", key)
    }

    fn max_metric() -> ConfigPath {
        protocol("ospf 100")
            .child("ospfv2")
            .child("global")
            .child("timers")
            .child("max-metric")
            .child("config")
    }

    fn area_interfaces_path(area: &str) -> ConfigPath {
        protocol("ospf 100")
            .child("ospfv2")
            .child("areas")
            .keyed("area", area)
            .child("interfaces")
            .child("interface")
    }

    #[test]
    fn test_process_keys() {
        let channel =
            MockChannel::new().with_output(SH_OSPF, "router ospf 100\nrouter ospf CORE\n");
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let list = ConfigPath::root()
            .keyed("network-instance", "default")
            .child("protocols")
            .child("protocol");
        assert_eq!(
            OspfProtocolReader.list_keys(&list, &ctx).unwrap(),
            ["ospf 100", "ospf CORE"]
        );
    }

    #[test]
    fn test_read_max_metric() {
        let channel = MockChannel::new().with_output(
            "show running-config router ospf 100 | include max-metric",
            " max-metric router-lsa on-startup 60 include-stub summary-lsa external-lsa\n",
        );
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let mut config = MaxMetricConfig::default();
        MaxMetricReader.populate(&max_metric(), &mut config, &ctx).unwrap();
        assert_eq!(config.set, Some(true));
        assert_eq!(config.timeout, Some(60));
        assert_eq!(
            config.include,
            [
                MaxMetricInclude::IncludeStub,
                MaxMetricInclude::SummaryLsa,
                MaxMetricInclude::IncludeType2External
            ]
        );
    }

    #[test]
    fn test_write_max_metric() {
        let config = MaxMetricConfig {
            set: Some(true),
            timeout: Some(60),
            include: vec![MaxMetricInclude::IncludeStub],
        };
        let ctx = WriteContext::new();
        assert_eq!(
            MaxMetricWriter.create(&max_metric(), &config, &ctx).unwrap().to_text(),
            "router ospf 100\nmax-metric router-lsa on-startup 60 include-stub\nexit\n"
        );
        assert_eq!(
            MaxMetricWriter.delete(&max_metric(), &config, &ctx).unwrap().to_text(),
            "router ospf 100\nno max-metric router-lsa on-startup 60 include-stub\nexit\n"
        );
    }

    #[test]
    fn test_unset_max_metric_removes_it() {
        let before = MaxMetricConfig {
            set: Some(true),
            ..MaxMetricConfig::default()
        };
        let after = MaxMetricConfig {
            set: Some(false),
            ..MaxMetricConfig::default()
        };
        let text = MaxMetricWriter
            .update(&max_metric(), &before, &after, &WriteContext::new())
            .unwrap()
            .to_text();
        assert_eq!(text, "router ospf 100\nno max-metric router-lsa\nexit\n");
    }

    #[test]
    fn test_areas_and_interfaces() {
        let channel = MockChannel::new().with_output(AREAS_COMMAND, AREAS);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let areas = protocol("ospf 100").child("ospfv2").child("areas").child("area");
        assert_eq!(AreaReader.list_keys(&areas, &ctx).unwrap(), ["0", "0.0.0.1"]);
        assert_eq!(
            AreaInterfaceReader
                .list_keys(&area_interfaces_path("0.0.0.1"), &ctx)
                .unwrap(),
            ["GigabitEthernet0/0/0/1", "GigabitEthernet0/0/0/10"]
        );
        assert_eq!(channel.executed().len(), 1);
    }

    #[test]
    fn test_interface_cost_exact_name() {
        let channel = MockChannel::new().with_output(AREAS_COMMAND, AREAS);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let mut config = AreaInterfaceConfig::default();
        AreaInterfaceConfigReader
            .populate(
                &area_interfaces_path("0.0.0.1")
                    .with_key("GigabitEthernet0/0/0/1")
                    .child("config"),
                &mut config,
                &ctx,
            )
            .unwrap();
        assert_eq!(config.metric, Some(20));

        let mut config = AreaInterfaceConfig::default();
        AreaInterfaceConfigReader
            .populate(
                &area_interfaces_path("0.0.0.1")
                    .with_key("GigabitEthernet0/0/0/10")
                    .child("config"),
                &mut config,
                &ctx,
            )
            .unwrap();
        assert_eq!(config.id, "GigabitEthernet0/0/0/10");
        assert_eq!(config.metric, None);
    }

    #[test]
    fn test_bgp_protocol_has_no_areas() {
        let channel = MockChannel::new();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let areas = protocol("bgp default").child("ospfv2").child("areas").child("area");
        assert!(AreaReader.list_keys(&areas, &ctx).unwrap().is_empty());
        assert!(channel.executed().is_empty());
    }
}
