//! Handlers shared by every device unit.
//!
//! Each device exposes the global routing instance as the `default` member of
//! `/network-instance`. It exists without any configuration and cannot be
//! created, changed or removed.
//!
//! Also holds readers whose output format several dialects share.

use crate::model::{
    DEFAULT_NETWORK, InstanceType, Interface, Ipv4Address, Ipv4AddressConfig, NetworkInstance,
    NetworkInstanceConfig, Subinterface, interface::subinterface_name,
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    ConfigPath, ConfigReader, ConfigReaderChild, Error, Guarded, ListReader, Normalize, ReadContext,
    Reserved, Result, WriterChild, extract,
};

static MASKED_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(ip|ipv4) address (?<ip>[0-9.]+) (?<mask>[0-9.]+)")
        .expect("masked address regex")
});

/// Lists only the default instance.
pub struct DefaultInstanceReader;

impl ListReader<NetworkInstance> for DefaultInstanceReader {
    fn list_keys(&self, _path: &ConfigPath, _ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(vec![DEFAULT_NETWORK.to_string()])
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

/// Fills the configuration of the default instance.
pub struct DefaultConfigReader;

impl ConfigReader<NetworkInstanceConfig> for DefaultConfigReader {
    fn populate(
        &self,
        _path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = DEFAULT_NETWORK.to_string();
        builder.kind = InstanceType::DefaultInstance;
        Ok(())
    }
}

/// [`DefaultConfigReader`] as a composite child owning the `default` key.
pub fn default_config_child() -> impl ConfigReaderChild<NetworkInstanceConfig> {
    Guarded::new(DefaultConfigReader, |path: &ConfigPath, _: &ReadContext<'_>| {
        Ok(is_default_instance(path))
    })
}

/// Composite child claiming the default instance and rejecting any change to it.
pub fn reserved_default_writer() -> impl WriterChild<NetworkInstanceConfig> {
    Reserved::new(
        "Default network instance cannot be manipulated",
        |_: &ConfigPath, config: &NetworkInstanceConfig| {
            config.kind == InstanceType::DefaultInstance
        },
    )
}

/// Whether `path` lies under the default network instance.
///
/// Paths outside `/network-instance` belong to the default instance too.
#[must_use]
pub fn is_default_instance(path: &ConfigPath) -> bool {
    path.first_key_of("network-instance")
        .is_none_or(|name| name == DEFAULT_NETWORK)
}

// ============================================================================
// Interfaces
// ============================================================================

/// Interface names printed by one command.
///
/// `parse` returns every name in output order, subinterfaces (`parent.N`)
/// included; the readers split them into the two list levels.
#[derive(Clone, Copy)]
pub struct InterfaceNames {
    command: &'static str,
    parse: fn(&str) -> Vec<String>,
}

impl InterfaceNames {
    pub fn new(command: &'static str, parse: fn(&str) -> Vec<String>) -> Self {
        Self { command, parse }
    }

    fn all(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok((self.parse)(&ctx.read(path, self.command)?))
    }

    /// Reader for `/interface`.
    pub fn interfaces(self) -> InterfaceListReader {
        InterfaceListReader(self)
    }

    /// Reader for `/interface[name]/subinterfaces/subinterface`.
    pub fn subinterfaces(self) -> SubinterfaceReader {
        SubinterfaceReader(self)
    }
}

/// Split `Gi0/1.100` into `("Gi0/1", Some(100))`.
fn split_subinterface(name: &str) -> (&str, Option<u32>) {
    match name.rsplit_once('.') {
        Some((parent, index)) => match index.parse() {
            Ok(index) => (parent, Some(index)),
            Err(_) => (name, None),
        },
        None => (name, None),
    }
}

/// Names of top-level `interface NAME` statements of a running configuration.
pub fn interface_statements(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix("interface "))
        .filter_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

pub struct InterfaceListReader(InterfaceNames);

impl ListReader<Interface> for InterfaceListReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(self
            .0
            .all(path, ctx)?
            .into_iter()
            .filter(|name| split_subinterface(name).1.is_none())
            .collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Interface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("interface")?.to_string();
        Ok(())
    }
}

/// Subinterface indexes; index 0 stands for the interface itself.
pub struct SubinterfaceReader(InterfaceNames);

impl ListReader<Subinterface> for SubinterfaceReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let interface = path.require_key("interface")?;
        let mut keys = vec!["0".to_string()];
        keys.extend(self.0.all(path, ctx)?.iter().filter_map(|name| match split_subinterface(name) {
            (parent, Some(index)) if parent == interface => Some(index.to_string()),
            _ => None,
        }));
        Ok(keys)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Subinterface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.index = numeric_key(path, "subinterface")?;
        Ok(())
    }
}

// ============================================================================
// IPv4 addresses in mask notation
// ============================================================================

/// Reader for addresses printed as `ip address A.B.C.D M.M.M.M`.
///
/// `command` receives the interface name qualified with the subinterface
/// index (`Gi0/1.100`, or `Gi0/1` for index 0).
pub struct MaskedIpv4Reader {
    command: fn(&str) -> String,
}

impl MaskedIpv4Reader {
    pub fn new(command: fn(&str) -> String) -> Self {
        Self { command }
    }

    fn addresses(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<(String, String)>> {
        let interface = path.require_key("interface")?;
        let index: u32 = numeric_key(path, "subinterface")?;
        let output = ctx.read(path, &(self.command)(&subinterface_name(interface, index)))?;
        Ok(extract::extract_all(&output, Normalize::None, &MASKED_ADDRESS, |caps| {
            Some((caps["ip"].to_string(), caps["mask"].to_string()))
        }))
    }
}

impl ListReader<Ipv4Address> for MaskedIpv4Reader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        Ok(self.addresses(path, ctx)?.into_iter().map(|(ip, _)| ip).collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Ipv4Address,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.ip = path.require_key("address")?.to_string();
        Ok(())
    }
}

impl ConfigReader<Ipv4AddressConfig> for MaskedIpv4Reader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Ipv4AddressConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let ip = path.require_key("address")?;
        let found = self
            .addresses(path, ctx)?
            .into_iter()
            .find(|(found, _)| found == ip);
        let Some((_, mask)) = found else {
            return Ok(());
        };
        // An address without a usable prefix length cannot be modelled
        let Some(prefix) = extract::mask_to_prefix(&mask) else {
            return Err(Error::malformed(path, format!("netmask {mask} of {ip} is not contiguous")));
        };
        builder.ip = ip.to_string();
        builder.prefix_length = Some(prefix);
        Ok(())
    }
}

/// Compile a pattern built from device data (names, ids) for one read.
///
/// # Errors
///
/// `InvalidData` when the data makes the pattern invalid.
pub fn compile(path: &ConfigPath, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::invalid(path, format!("cannot build matcher: {e}")).with_source(e))
}

/// Parse a mandatory key segment into a number.
///
/// # Errors
///
/// `InvalidData` when the key is not a number.
pub fn numeric_key<N: std::str::FromStr>(path: &ConfigPath, node: &str) -> Result<N> {
    let key = path.require_key(node)?;
    key.parse()
        .map_err(|_| Error::invalid(path, format!("{node} key '{key}' is not a number")))
}
