//! Link up/down traps per interface.

use crate::model::{SnmpInterfaceConfig, TrapEvent};
use translate::{BlockBuilder, CommandSequence, ConfigPath, Frame, Result, WriteContext, Writer};

fn frame(interface: &str) -> Frame {
    Frame::new([format!("snmp-server interface {interface}")], ["exit"])
}

/// Traps are on by default; the model only names the enabled ones, so an
/// interface without `LINKUPDOWN` as its first event leaves the device as is.
pub struct SnmpInterfaceWriter;

impl Writer<SnmpInterfaceConfig> for SnmpInterfaceWriter {
    fn create(
        &self,
        _path: &ConfigPath,
        after: &SnmpInterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        if after.enabled_trap_for_event.first() != Some(&TrapEvent::Linkupdown) {
            return Ok(CommandSequence::empty());
        }
        Ok(BlockBuilder::new(frame(&after.interface_id))
            .line("no notification linkupdown disable")
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &SnmpInterfaceConfig,
        after: &SnmpInterfaceConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(self.delete(path, before, ctx)?.then(self.create(path, after, ctx)?))
    }

    fn delete(
        &self,
        _path: &ConfigPath,
        before: &SnmpInterfaceConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(frame(&before.interface_id))
            .line("notification linkupdown disable")
            .finish())
    }
}
