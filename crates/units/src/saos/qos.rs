//! Scheduler policies.
//!
//! Two things surface as scheduler policies. Traffic profiles
//! (`traffic-profiling standard-profile`) are created on a port under a name;
//! the device numbers them and later statements refer to them by name. Egress
//! port queue groups exist for every port and are named after it; they are
//! read only.

use crate::model::{SchedulerPolicy, SchedulerPolicyConfig, SchedulerType};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use translate::{
    BlockBuilder, Claim, CommandSequence, CompositeConfigReader, CompositeListReader,
    CompositeWriter, ConfigPath, ConfigReader, Error, Field, Frame, Guarded, ListReader, Normalize,
    ReadContext, Reserved, Result, WriteContext, Writer, ensure_unchanged, extract,
};

const SH_PROFILES: &str = "configuration search string \"traffic-profiling\"";
const SH_QUEUE_GROUPS: &str = "configuration search string \"egress-port-queue-group\"";

static PROFILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^traffic-profiling standard-profile create port (?<port>\S+) ",
        r"profile \S+ name (?<name>\S+)(?<rest>.*)$",
    ))
    .expect("standard-profile regex")
});
static VS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bvs (?<vs>\S+)").expect("vs regex"));
static CIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcir (?<cir>\d+)").expect("cir regex"));

pub struct ProfileReader;

impl ListReader<SchedulerPolicy> for ProfileReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_PROFILES)?;
        Ok(extract::extract_keys(&output, Normalize::None, &PROFILE, "name"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut SchedulerPolicy,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("scheduler-policy")?.to_string();
        Ok(())
    }
}

fn parse_profile(caps: &Captures<'_>) -> SchedulerPolicyConfig {
    let rest = &caps["rest"];
    SchedulerPolicyConfig {
        name: caps["name"].to_string(),
        kind: SchedulerType::PortPolicy,
        interface_id: Some(caps["port"].to_string()),
        vs_name: VS.captures(rest).map(|c| c["vs"].to_string()),
        cir: CIR.captures(rest).and_then(|c| c["cir"].parse().ok()),
    }
}

pub struct ProfileConfigReader;

impl ConfigReader<SchedulerPolicyConfig> for ProfileConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut SchedulerPolicyConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("scheduler-policy")?;
        let output = ctx.read(path, SH_PROFILES)?;
        if let Some(found) = extract::extract_first(&output, Normalize::None, &PROFILE, |caps| {
            (&caps["name"] == name).then(|| parse_profile(caps))
        }) {
            *builder = found;
        }
        Ok(())
    }
}

static QUEUE_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^traffic-services queuing egress-port-queue-group set ",
        r"(?:queue \d+ )?port (?<port>\S+)(?<rest>.*)$",
    ))
    .expect("egress-port-queue-group regex")
});

/// Egress port queue groups, one per port that has queuing statements.
pub struct QueueGroupReader;

impl ListReader<SchedulerPolicy> for QueueGroupReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_QUEUE_GROUPS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &QUEUE_GROUP, "port"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut SchedulerPolicy,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("scheduler-policy")?.to_string();
        Ok(())
    }
}

impl ConfigReader<SchedulerPolicyConfig> for QueueGroupReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut SchedulerPolicyConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let port = path.require_key("scheduler-policy")?;
        let output = ctx.read(path, SH_QUEUE_GROUPS)?;
        builder.name = port.to_string();
        builder.kind = SchedulerType::ServicePolicy;
        builder.interface_id = Some(port.to_string());
        builder.cir = extract::extract_first(&output, Normalize::None, &QUEUE_GROUP, |caps| {
            if &caps["port"] != port {
                return None;
            }
            CIR.captures(&caps["rest"]).and_then(|c| c["cir"].parse().ok())
        });
        Ok(())
    }
}

/// Whether `reader` lists the policy `path` belongs to.
fn listed_by(
    reader: &dyn ListReader<SchedulerPolicy>,
    path: &ConfigPath,
    ctx: &ReadContext<'_>,
) -> Result<bool> {
    let name = path.require_key("scheduler-policy")?;
    let list = ConfigPath::root()
        .child("qos")
        .child("scheduler-policies")
        .child("scheduler-policy");
    Ok(reader.list_keys(&list, ctx)?.iter().any(|k| k == name))
}

/// Traffic profiles first, then queue groups.
pub fn scheduler_policy_reader() -> CompositeListReader<SchedulerPolicy> {
    CompositeListReader::new(vec![Box::new(ProfileReader), Box::new(QueueGroupReader)])
}

pub fn scheduler_config_reader() -> CompositeConfigReader<SchedulerPolicyConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(ProfileConfigReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            listed_by(&ProfileReader, path, ctx)
        })),
        Box::new(Guarded::new(QueueGroupReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            listed_by(&QueueGroupReader, path, ctx)
        })),
    ])
}

pub fn scheduler_config_writer() -> CompositeWriter<SchedulerPolicyConfig> {
    CompositeWriter::new(vec![
        Box::new(Claim::new(ProfileWriter, |_: &ConfigPath, c: &SchedulerPolicyConfig| {
            c.kind == SchedulerType::PortPolicy
        })),
        Box::new(Reserved::new(
            "egress port queue groups are owned by their port",
            |_: &ConfigPath, c: &SchedulerPolicyConfig| c.kind == SchedulerType::ServicePolicy,
        )),
    ])
}

fn saved() -> Frame {
    Frame::new(Vec::<String>::new(), ["configuration save"])
}

fn require_port<'a>(path: &ConfigPath, config: &'a SchedulerPolicyConfig) -> Result<&'a str> {
    config
        .interface_id
        .as_deref()
        .ok_or_else(|| Error::invalid(path, "traffic profile needs the port it is attached to"))
}

/// Writer for standard profiles. Port and virtual switch are fixed at creation.
pub struct ProfileWriter;

impl Writer<SchedulerPolicyConfig> for ProfileWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &SchedulerPolicyConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let port = require_port(path, after)?;
        let mut line =
            format!("traffic-profiling standard-profile create port {port} name {}", after.name);
        if let Some(vs) = &after.vs_name {
            line.push_str(&format!(" vs {vs}"));
        }
        if let Some(cir) = after.cir {
            line.push_str(&format!(" cir {cir}"));
        }
        Ok(BlockBuilder::new(saved()).line(line).finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &SchedulerPolicyConfig,
        after: &SchedulerPolicyConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "interface-id", &before.interface_id, &after.interface_id)?;
        ensure_unchanged(path, "vs-name", &before.vs_name, &after.vs_name)?;
        let port = require_port(path, after)?;
        let cir = match Field::between(before.cir.as_ref(), after.cir.as_ref()) {
            Field::Unchanged => return Ok(CommandSequence::empty()),
            Field::Set(cir) | Field::Changed { new: cir, .. } => cir,
            Field::Unset(_) => {
                return Err(Error::invalid(path, "cir of a standard profile cannot be removed")
                    .with_before(before)
                    .with_after(after));
            }
        };
        Ok(BlockBuilder::new(saved())
            .line(format!(
                "traffic-profiling standard-profile set port {port} profile {} cir {cir}",
                after.name
            ))
            .finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &SchedulerPolicyConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let port = require_port(path, before)?;
        Ok(BlockBuilder::new(saved())
            .line(format!(
                "traffic-profiling standard-profile delete port {port} profile {}",
                before.name
            ))
            .finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{ErrorKind, MockChannel, ReadCache};

    const QUEUE_GROUPS: &str = "\
        traffic-services queuing egress-port-queue-group set queue 3 port 4 scheduler-weight 6\n\
        traffic-services queuing egress-port-queue-group set port 7 cir 101056\n\
        traffic-services queuing egress-port-queue-group set queue 0 port 7 scheduler-weight 6\n";

    const OUTPUT: &str = "traffic-profiling set port 1 mode advanced\n\
        traffic-profiling standard-profile create port 1 profile 1 name CIA_CoS0 \
        cir 50048 eir 0 cbs 8 ebs 0\n\
        traffic-profiling standard-profile set port 1 profile CIA_CoS0 \
        green-remark-rcos 0 yellow-remark-rcos 0\n\
        traffic-profiling standard-profile create port 1 profile 2 name V40 \
        cir 10048 ebs 0 vs VLAN111222\n\
        traffic-profiling standard-profile create port 5 profile 1 name Test1 \
        cir 10048 eir 0 cbs 128 ebs 0\n\
        traffic-profiling enable port 2\n\
        traffic-profiling enable\n";

    fn path(name: &str) -> ConfigPath {
        ConfigPath::root()
            .child("qos")
            .child("scheduler-policies")
            .keyed("scheduler-policy", name)
            .child("config")
    }

    fn profile(name: &str, port: &str, vs: Option<&str>, cir: u64) -> SchedulerPolicyConfig {
        SchedulerPolicyConfig {
            name: name.into(),
            kind: SchedulerType::PortPolicy,
            interface_id: Some(port.into()),
            vs_name: vs.map(Into::into),
            cir: Some(cir),
        }
    }

    #[test]
    fn test_profile_names() {
        let channel = MockChannel::new().with_output(SH_PROFILES, OUTPUT);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let list = ConfigPath::root()
            .child("qos")
            .child("scheduler-policies")
            .child("scheduler-policy");
        let keys = ProfileReader.list_keys(&list, &ctx).unwrap();
        assert_eq!(keys, ["CIA_CoS0", "V40", "Test1"]);
    }

    #[test]
    fn test_profile_config() {
        let channel = MockChannel::new().with_output(SH_PROFILES, OUTPUT);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);

        let mut config = SchedulerPolicyConfig::default();
        ProfileConfigReader.populate(&path("V40"), &mut config, &ctx).unwrap();
        assert_eq!(config, profile("V40", "1", Some("VLAN111222"), 10048));

        let mut config = SchedulerPolicyConfig::default();
        ProfileConfigReader.populate(&path("Test1"), &mut config, &ctx).unwrap();
        assert_eq!(config.vs_name, None);
        assert_eq!(config.interface_id.as_deref(), Some("5"));
    }

    #[test]
    fn test_create() {
        let text = ProfileWriter
            .create(
                &path("Prof_1"),
                &profile("Prof_1", "2", Some("VLAN111222"), 10042),
                &WriteContext::new(),
            )
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "traffic-profiling standard-profile create port 2 name Prof_1 vs VLAN111222 cir 10042\n\
             configuration save\n"
        );
    }

    #[test]
    fn test_update_cir() {
        let text = ProfileWriter
            .update(
                &path("Prof_1"),
                &profile("Prof_1", "1", Some("VLAN111222"), 10048),
                &profile("Prof_1", "1", Some("VLAN111222"), 20048),
                &WriteContext::new(),
            )
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "traffic-profiling standard-profile set port 1 profile Prof_1 cir 20048\n\
             configuration save\n"
        );
    }

    #[test]
    fn test_port_is_fixed() {
        let err = ProfileWriter
            .update(
                &path("Prof_1"),
                &profile("Prof_1", "1", None, 10048),
                &profile("Prof_1", "2", None, 10048),
                &WriteContext::new(),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ImmutableFieldChanged);
    }

    #[test]
    fn test_delete() {
        let text = ProfileWriter
            .delete(&path("Profil_1"), &profile("Profil_1", "1", None, 10043), &WriteContext::new())
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "traffic-profiling standard-profile delete port 1 profile Profil_1\n\
             configuration save\n"
        );
    }

    fn channel() -> MockChannel {
        MockChannel::new()
            .with_output(SH_PROFILES, OUTPUT)
            .with_output(SH_QUEUE_GROUPS, QUEUE_GROUPS)
    }

    #[test]
    fn test_policy_names_include_queue_groups() {
        let channel = channel();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let list = ConfigPath::root()
            .child("qos")
            .child("scheduler-policies")
            .child("scheduler-policy");
        let keys = scheduler_policy_reader().list_keys(&list, &ctx).unwrap();
        assert_eq!(keys, ["CIA_CoS0", "V40", "Test1", "4", "7"]);
    }

    #[test]
    fn test_config_by_policy_type() {
        let channel = channel();
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        let reader = scheduler_config_reader();

        let mut config = SchedulerPolicyConfig::default();
        reader.populate(&path("V40"), &mut config, &ctx).unwrap();
        assert_eq!(config, profile("V40", "1", Some("VLAN111222"), 10048));

        let mut config = SchedulerPolicyConfig::default();
        reader.populate(&path("7"), &mut config, &ctx).unwrap();
        assert_eq!(config.kind, SchedulerType::ServicePolicy);
        assert_eq!(config.interface_id.as_deref(), Some("7"));
        assert_eq!(config.cir, Some(101056));

        let mut config = SchedulerPolicyConfig::default();
        reader.populate(&path("4"), &mut config, &ctx).unwrap();
        assert_eq!(config.kind, SchedulerType::ServicePolicy);
        assert_eq!(config.cir, None);
    }

    #[test]
    fn test_queue_groups_are_read_only() {
        let group = SchedulerPolicyConfig {
            name: "7".into(),
            kind: SchedulerType::ServicePolicy,
            interface_id: Some("7".into()),
            vs_name: None,
            cir: Some(101056),
        };
        let err = scheduler_config_writer()
            .delete(&path("7"), &group, &WriteContext::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ForbiddenLifecycleOperation);

        let text = scheduler_config_writer()
            .create(&path("P"), &profile("P", "2", None, 1000), &WriteContext::new())
            .unwrap()
            .to_text();
        assert_eq!(
            text,
            "traffic-profiling standard-profile create port 2 name P cir 1000\nconfiguration save\n"
        );
    }
}
