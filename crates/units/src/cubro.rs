//! Cubro packet broker unit: access lists.

use crate::model::{AclSet, AclSetConfig, AclType};
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use translate::{
    ConfigPath, ConfigReader, ListReader, Normalize, ReadContext, RegistryBuilder, Result, extract,
};

const SH_ACCESS_LISTS: &str = "show running-config | include ^access-list";

static ACCESS_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^access-list (?<type>ipv4|ipv6) (?<name>\S+)").expect("access-list regex")
});

/// Name and address family of one `access-list` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTypeEntry {
    pub name: String,
    pub kind: AclType,
}

impl NameTypeEntry {
    /// Entry of a line matched by the access-list pattern.
    pub fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        Some(Self {
            name: caps.name("name")?.as_str().to_string(),
            kind: AclType::from_family(caps.name("type")?.as_str())?,
        })
    }

    /// Every entry of `output`, in order, duplicates kept.
    pub fn parse_all(output: &str) -> Vec<Self> {
        extract::extract_all(output, Normalize::None, &ACCESS_LIST, Self::from_captures)
    }
}

pub struct AclSetReader;

impl ListReader<AclSet> for AclSetReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_ACCESS_LISTS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &ACCESS_LIST, "name"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclSet,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.set_name = path.require_key("acl-set")?.to_string();
        Ok(())
    }
}

pub struct AclSetConfigReader;

impl ConfigReader<AclSetConfig> for AclSetConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut AclSetConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let name = path.require_key("acl-set")?;
        let output = ctx.read(path, SH_ACCESS_LISTS)?;
        let found = NameTypeEntry::parse_all(&output)
            .into_iter()
            .find(|e| e.name == name);
        if let Some(entry) = found {
            builder.set_name = entry.name;
            builder.kind = entry.kind;
        }
        Ok(())
    }
}

pub struct CubroUnit;

impl Unit for CubroUnit {
    fn device(&self) -> Device {
        Device::Cubro
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        builder
            .add_list_reader(pattern(paths::ACL_SET), AclSetReader)
            .add_reader(pattern(paths::ACL_SET_CONFIG), AclSetConfigReader);
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[r"^% Invalid input", r"^% Unknown command", r"^Error:"]
    }
}
