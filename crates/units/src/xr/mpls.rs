//! Traffic engineering tunnels and RSVP interfaces.
//!
//! Both live in the global routing table, so other network instances list
//! nothing.

use crate::common::is_default_instance;
use crate::model::{MetricType, RsvpInterface, Tunnel, TunnelConfig};
use regex::Regex;
use std::sync::LazyLock;
use translate::{ConfigPath, ConfigReader, ListReader, Normalize, ReadContext, Result, extract};

const SH_TUNNELS: &str = "show running-config | include ^interface tunnel-te";
const SH_RSVP: &str = "do show running-config rsvp";

static TUNNEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^interface tunnel-te(?<name>[0-9]+)").expect("tunnel name regex")
});
static AUTOROUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*autoroute announce").expect("autoroute regex"));
static METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*metric (?<kind>absolute|relative) (?<metric>\d+)")
        .expect("tunnel metric regex")
});
static LOAD_SHARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*load-share (?<share>\d+)").expect("load share regex"));
static DESTINATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*destination (?<address>\S+)").expect("destination regex"));
static RSVP_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^interface (?<name>\S+)").expect("rsvp interface regex"));

/// `tunnel-te` interfaces, keyed by tunnel number.
pub struct TunnelReader;

impl ListReader<Tunnel> for TunnelReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_default_instance(path) {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_TUNNELS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &TUNNEL_NAME, "name"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Tunnel,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("tunnel")?.to_string();
        Ok(())
    }
}

pub struct TunnelConfigReader;

impl ConfigReader<TunnelConfig> for TunnelConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut TunnelConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("tunnel")?;
        let output = ctx.read(path, &format!("show running-config interface tunnel-te{name}"))?;

        builder.name = name.to_string();
        if output.lines().any(|l| AUTOROUTE.is_match(l)) {
            builder.shortcut_eligible = Some(true);
        }
        let metric = extract::extract_first(&output, Normalize::None, &METRIC, |caps| {
            let kind = match &caps["kind"] {
                "absolute" => MetricType::Absolute,
                _ => MetricType::Relative,
            };
            Some((kind, caps["metric"].parse().ok()?))
        });
        if let Some((kind, metric)) = metric {
            builder.metric_type = Some(kind);
            builder.metric = Some(metric);
        }
        builder.load_share =
            extract::extract_parsed(&output, Normalize::None, &LOAD_SHARE, "share");
        builder.destination =
            extract::extract_value(&output, Normalize::None, &DESTINATION, "address");
        Ok(())
    }
}

/// Interfaces under the `rsvp` block.
///
/// Indentation and spacing of the block vary between releases, so lines are
/// matched with collapsed whitespace.
pub struct RsvpInterfaceReader;

impl ListReader<RsvpInterface> for RsvpInterfaceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_default_instance(path) {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_RSVP)?;
        Ok(extract::extract_keys(
            &output,
            Normalize::CollapseWhitespace,
            &RSVP_INTERFACE,
            "name",
        ))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut RsvpInterface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.interface_id = path.require_key("interface")?.to_string();
        Ok(())
    }
}
