//! LDP interface binding.

use crate::model::{LdpGlobalConfig, LdpInterfaceConfig};
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, Error, Frame, Result, WriteContext, Writer,
};

fn frame() -> Frame {
    Frame::new(["configure terminal"], ["end"])
}

/// Writer for `.../ldp/interface-attributes/interfaces/interface[id]/config`.
///
/// The LDP router id follows the interface; only one can be bound.
pub struct LdpInterfaceWriter;

impl LdpInterfaceWriter {
    /// Reject the binding when the transaction disables LDP in the same instance.
    fn ensure_enabled(path: &ConfigPath, ctx: &WriteContext) -> Result<()> {
        let Some(global) = path.cut_at("network-instance").map(|ni| {
            ni.child("mpls")
                .child("signaling-protocols")
                .child("ldp")
                .child("global")
                .child("config")
        }) else {
            return Ok(());
        };
        match ctx.after::<LdpGlobalConfig>(&global)? {
            Some(LdpGlobalConfig { enabled: Some(false) }) => {
                Err(Error::invalid(path, "LDP is disabled in this network instance"))
            }
            _ => Ok(()),
        }
    }
}

impl Writer<LdpInterfaceConfig> for LdpInterfaceWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &LdpInterfaceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Self::ensure_enabled(path, ctx)?;
        Ok(BlockBuilder::new(frame())
            .line(format!("mpls ldp router-id {}", after.interface_id))
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &LdpInterfaceConfig,
        after: &LdpInterfaceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(self.delete(path, before, ctx)?.then(self.create(path, after, ctx)?))
    }

    fn delete(
        &self,
        _path: &ConfigPath,
        before: &LdpInterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(frame())
            .line(format!("no mpls ldp router-id {}", before.interface_id))
            .finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use translate::{ErrorKind, Snapshot};

    fn path() -> ConfigPath {
        ConfigPath::root()
            .keyed("network-instance", "default")
            .child("mpls")
            .child("signaling-protocols")
            .child("ldp")
            .child("interface-attributes")
            .child("interfaces")
            .keyed("interface", "tunnel 1")
            .child("config")
    }

    fn tunnel() -> LdpInterfaceConfig {
        LdpInterfaceConfig {
            interface_id: "tunnel 1".into(),
        }
    }

    #[test]
    fn test_write_and_delete() {
        let ctx = WriteContext::new();
        assert_eq!(
            LdpInterfaceWriter.create(&path(), &tunnel(), &ctx).unwrap().to_text(),
            "configure terminal\nmpls ldp router-id tunnel 1\nend\n"
        );
        assert_eq!(
            LdpInterfaceWriter.delete(&path(), &tunnel(), &ctx).unwrap().to_text(),
            "configure terminal\nno mpls ldp router-id tunnel 1\nend\n"
        );
    }

    #[test]
    fn test_disabled_ldp_rejected() {
        let global = path()
            .cut_at("network-instance")
            .unwrap()
            .child("mpls")
            .child("signaling-protocols")
            .child("ldp")
            .child("global")
            .child("config");
        let snapshot =
            Snapshot::from_data(&global, &LdpGlobalConfig { enabled: Some(false) }).unwrap();
        let ctx = WriteContext::new().with_after(global, snapshot);
        let err = LdpInterfaceWriter.create(&path(), &tunnel(), &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
