//! Ring protection: VLANs protected by virtual rings.
//!
//! Rings are provisioned outside this unit; they are only read.

use crate::common::{compile, is_default_instance, numeric_key};
use crate::model::{VirtualRing, Vlan};
use regex::Regex;
use std::sync::LazyLock;
use translate::{
    CompositeListReader, ConfigPath, EmptyReader, ListReader, Normalize, ReadContext, Reserved,
    Result, extract,
};

const SH_VIRTUAL_RINGS: &str = "configuration search string \"virtual-ring add\"";

static RING_VID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ring-protection virtual-ring add ring \S+ vid (?<vid>\d+)")
        .expect("virtual ring vid regex")
});

/// VLANs of the default instance that carry a virtual ring.
pub struct RingVlanReader;

impl ListReader<Vlan> for RingVlanReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        if !is_default_instance(path) {
            return Ok(Vec::new());
        }
        let output = ctx.read(path, SH_VIRTUAL_RINGS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &RING_VID, "vid"))
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

/// VLANs of every instance: ring VLANs plus the not yet parsed VSI VLANs.
pub fn vlan_reader() -> CompositeListReader<Vlan> {
    CompositeListReader::new(vec![
        Box::new(RingVlanReader),
        Box::new(EmptyReader::<Vlan>::new("L2VSI vlans")),
    ])
}

/// Virtual rings protecting one VLAN.
pub struct VirtualRingReader;

impl VirtualRingReader {
    /// Ring names of `output` bound to `vlan`.
    pub fn ring_names(path: &ConfigPath, output: &str, vlan: &str) -> Result<Vec<String>> {
        let pattern = compile(
            path,
            &format!(
                r"ring-protection virtual-ring add ring (?<name>\S+) vid {}(?:\s|$)",
                regex::escape(vlan)
            ),
        )?;
        Ok(extract::extract_keys(output, Normalize::None, &pattern, "name"))
    }
}

impl ListReader<VirtualRing> for VirtualRingReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let vlan = path.require_key("vlan")?;
        let output = ctx.read(path, SH_VIRTUAL_RINGS)?;
        Self::ring_names(path, &output, vlan)
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut VirtualRing,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("virtual-ring")?.to_string();
        Ok(())
    }
}

/// Writer for `/logical-rings/virtual-ring/config`, rejecting every change.
pub fn virtual_ring_writer() -> Reserved<impl Fn(&ConfigPath, &VirtualRing) -> bool + Send + Sync> {
    Reserved::new("Virtual ring configuration is read-only", |_: &ConfigPath, _: &VirtualRing| true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{ErrorKind, MockChannel, ReadCache, WriteContext, Writer};

    const OUTPUT: &str = "ring-protection virtual-ring add ring v-ring-13 vid 10\n\
                          ring-protection virtual-ring add ring v-ring-14 vid 100\n\
                          ring-protection virtual-ring add ring v-ring-15 vid 10\n";

    fn vlans(ni: &str) -> ConfigPath {
        ConfigPath::root()
            .keyed("network-instance", ni)
            .child("vlans")
            .child("vlan")
    }

    #[test]
    fn test_rings_of_vlan() {
        let path = vlans("default").with_key("10").child("virtual-rings").child("virtual-ring");
        assert_eq!(
            VirtualRingReader::ring_names(&path, OUTPUT, "10").unwrap(),
            ["v-ring-13", "v-ring-15"]
        );
        assert_eq!(VirtualRingReader::ring_names(&path, OUTPUT, "100").unwrap(), ["v-ring-14"]);
    }

    #[test]
    fn test_ring_vlans_only_in_default() {
        let channel = MockChannel::new().with_output(SH_VIRTUAL_RINGS, OUTPUT);
        let cache = ReadCache::new();
        let ctx = ReadContext::new(&channel, &cache);
        assert_eq!(vlan_reader().list_keys(&vlans("default"), &ctx).unwrap(), ["10", "100"]);
        assert!(vlan_reader().list_keys(&vlans("VS1"), &ctx).unwrap().is_empty());
    }

    #[test]
    fn test_writer_rejects_everything() {
        let path = ConfigPath::root()
            .child("logical-rings")
            .keyed("virtual-ring", "v-ring-13")
            .child("config");
        let ring = VirtualRing {
            name: "v-ring-13".into(),
        };
        let renamed = VirtualRing { name: "v-test".into() };
        let writer = virtual_ring_writer();
        let ctx = WriteContext::new();
        for err in [
            writer.create(&path, &ring, &ctx).unwrap_err(),
            writer.update(&path, &ring, &renamed, &ctx).unwrap_err(),
            writer.delete(&path, &ring, &ctx).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::ForbiddenLifecycleOperation);
        }
    }
}
