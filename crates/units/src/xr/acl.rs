//! Access lists bound to interfaces.

use super::interface::interface_type;
use crate::model::{AclInterface, AclSetConfig, AclType, InterfaceType};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    ConfigPath, ConfigReader, Error, ListReader, Normalize, ReadContext, Result, extract,
};

const SH_ACL_INTERFACES: &str =
    r#"show running-config interface | utility egrep "^interface|access-group""#;

static ACCESS_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?<family>ipv4|ipv6) access-group (?<name>\S+) (?<direction>ingress|egress)")
        .expect("access group regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ingress,
    Egress,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Self::Ingress => "ingress",
            Self::Egress => "egress",
        }
    }
}

fn interface_command(name: &str) -> String {
    format!("do show running-config interface {name}")
}

/// Sets applied in one direction on the interface of `path`.
fn bound_sets(
    path: &ConfigPath,
    ctx: &ReadContext<'_>,
    direction: Direction,
) -> Result<Vec<AclSetConfig>> {
    let interface = path.require_key("interface")?;
    let output = ctx.read(path, &interface_command(interface))?;
    Ok(extract::extract_all(&output, Normalize::None, &ACCESS_GROUP, |caps| {
        (&caps["direction"] == direction.keyword()).then(|| AclSetConfig {
            set_name: caps["name"].to_string(),
            kind: AclType::from_family(&caps["family"]).unwrap_or_default(),
        })
    }))
}

fn set_names(sets: Vec<AclSetConfig>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for set in sets {
        if !names.contains(&set.set_name) {
            names.push(set.set_name);
        }
    }
    names
}

/// Interfaces with at least one `access-group` statement.
pub struct AclInterfaceReader;

impl ListReader<AclInterface> for AclInterfaceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_ACL_INTERFACES)?;
        let mut current: Option<&str> = None;
        let mut names: Vec<String> = Vec::new();
        for line in output.lines() {
            if let Some(name) = line.strip_prefix("interface ") {
                current = name.split_whitespace().next();
            } else if line.contains("access-group") {
                if let Some(name) = current.filter(|n| !names.iter().any(|known| known == n)) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclInterface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.id = path.require_key("interface")?.to_string();
        Ok(())
    }
}

fn populate_set(
    path: &ConfigPath,
    node: &str,
    builder: &mut AclSetConfig,
    sets: Vec<AclSetConfig>,
) -> Result<()> {
    let name = path.require_key(node)?;
    if let Some(set) = sets.into_iter().find(|set| set.set_name == name) {
        *builder = set;
    }
    Ok(())
}

/// `ingress-acl-sets/ingress-acl-set`, keyed by set name.
pub struct IngressAclSetReader;

impl ListReader<AclSetConfig> for IngressAclSetReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(set_names(bound_sets(path, ctx, Direction::Ingress)?))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclSetConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        populate_set(path, "ingress-acl-set", builder, bound_sets(path, ctx, Direction::Ingress)?)
    }
}

/// `egress-acl-sets/egress-acl-set`, keyed by set name.
pub struct EgressAclSetReader;

impl ListReader<AclSetConfig> for EgressAclSetReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(set_names(bound_sets(path, ctx, Direction::Egress)?))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclSetConfig,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.set_name = path.require_key("egress-acl-set")?.to_string();
        Ok(())
    }
}

/// Type and name of an egress set.
///
/// Egress filters are only accepted on ethernet ports and bundles.
pub struct EgressAclSetConfigReader;

impl ConfigReader<AclSetConfig> for EgressAclSetConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclSetConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let interface = path.require_key("interface")?;
        let kind = interface_type(interface);
        if !matches!(kind, InterfaceType::EthernetCsmacd | InterfaceType::Ieee8023adLag) {
            return Err(Error::invalid(
                path,
                format!(
                    "Egress ACL is supported only on ethernet and bundle interfaces, \
                     {interface} is {kind}"
                ),
            ));
        }
        populate_set(path, "egress-acl-set", builder, bound_sets(path, ctx, Direction::Egress)?)
    }
}
