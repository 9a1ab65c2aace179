//! SAOS 8 virtual switches as L2VSI network instances.
//!
//! Sub-ports attach to a virtual switch with
//! `virtual-switch interface attach sub-port <name> vs <vs>`; each one shows up
//! as an interface of the instance. Virtual switches are only read.

use crate::common::{DefaultInstanceReader, default_config_child};
use crate::model::{
    InstanceInterface, InstanceInterfaceConfig, InstanceType, InterfaceType, NetworkInstance,
    NetworkInstanceConfig,
};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    CompositeConfigReader, CompositeListReader, ConfigPath, ConfigReader, Guarded, ListReader,
    Normalize, ReadContext, Result, extract,
};

const SH_VIRTUAL_SWITCHES: &str =
    "configuration search running-config string \"virtual-switch create\"";
const SH_ATTACHED: &str =
    "configuration search running-config string \"virtual-switch interface attach\"";

static VIRTUAL_SWITCH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^virtual-switch create vs (?<vs>\S+)").expect("virtual-switch regex")
});
static SUB_PORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^virtual-switch interface attach sub-port (?<port>\S+) vs (?<vs>\S+)")
        .expect("sub-port regex")
});

pub struct VirtualSwitchReader;

impl ListReader<NetworkInstance> for VirtualSwitchReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_VIRTUAL_SWITCHES)?;
        Ok(extract::extract_keys(&output, Normalize::None, &VIRTUAL_SWITCH, "vs"))
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

impl ConfigReader<NetworkInstanceConfig> for VirtualSwitchReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut NetworkInstanceConfig,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("network-instance")?.to_string();
        builder.kind = InstanceType::L2vsi;
        Ok(())
    }
}

pub fn instance_list_reader() -> CompositeListReader<NetworkInstance> {
    CompositeListReader::new(vec![Box::new(VirtualSwitchReader), Box::new(DefaultInstanceReader)])
}

pub fn instance_config_reader() -> CompositeConfigReader<NetworkInstanceConfig> {
    CompositeConfigReader::new(vec![
        Box::new(Guarded::new(VirtualSwitchReader, |path: &ConfigPath, ctx: &ReadContext<'_>| {
            let name = path.require_key("network-instance")?;
            let list = ConfigPath::root().child("network-instance");
            Ok(VirtualSwitchReader.list_keys(&list, ctx)?.iter().any(|k| k == name))
        })),
        Box::new(default_config_child()),
    ])
}

/// Sub-ports attached to the virtual switch of `path`.
fn sub_ports(path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
    let vs = path.require_key("network-instance")?;
    let output = ctx.read(path, SH_ATTACHED)?;
    let ports = extract::extract_all(&output, Normalize::None, &SUB_PORT, |caps| {
        (&caps["vs"] == vs).then(|| caps["port"].to_string())
    });
    Ok(ports)
}

pub struct SubPortReader;

impl ListReader<InstanceInterface> for SubPortReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        sub_ports(path, ctx)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut InstanceInterface,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.id = path.require_key("interface")?.to_string();
        Ok(())
    }
}

/// Configuration of an attached sub-port. Sub-ports are carried by LAGs.
pub struct SubPortConfigReader;

impl ConfigReader<InstanceInterfaceConfig> for SubPortConfigReader {
    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut InstanceInterfaceConfig,
        ctx: &ReadContext<'_>,
    ) -> Result<()> {
        let id = path.require_key("interface")?;
        if sub_ports(path, ctx)?.iter().any(|port| port == id) {
            builder.id = id.to_string();
            builder.interface = Some(id.to_string());
            builder.kind = Some(InterfaceType::Ieee8023adLag);
        }
        Ok(())
    }
}
