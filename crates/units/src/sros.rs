//! Nokia SR OS unit: IPsec clients of client databases.
//!
//! SR OS is configured through absolute `/configure` contexts, each block
//! leaving with `exit all`.

use crate::model::IpsecClientConfig;
use crate::paths::{self, pattern};
use crate::{Device, Unit};
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, Frame, RegistryBuilder, Result, WriteContext, Writer,
};

/// Writer for `/ipsec/client-groups/client-group[name]/clients/client[id]/config`.
pub struct ClientConfigWriter;

impl ClientConfigWriter {
    fn frame(path: &ConfigPath) -> Result<Frame> {
        let group = path.require_key("client-group")?;
        Ok(Frame::new(
            [
                "/configure".to_string(),
                "ipsec".to_string(),
                format!("client-db \"{group}\""),
            ],
            ["exit all"],
        ))
    }
}

impl Writer<IpsecClientConfig> for ClientConfigWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &IpsecClientConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(Self::frame(path)?)
            .line(format!("client {} create", after.client_id))
            .opt(after.enabled.as_ref(), |enabled| {
                if *enabled { "no shutdown" } else { "shutdown" }.to_string()
            })
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &IpsecClientConfig,
        after: &IpsecClientConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let frame = Self::frame(path)?.enter(format!("client {} create", after.client_id));
        Ok(BlockBuilder::new(frame)
            .flag(before.enabled, after.enabled, true, "no shutdown", "shutdown")
            .finish())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &IpsecClientConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(Self::frame(path)?)
            .line(format!("no client {}", before.client_id))
            .finish())
    }
}

pub struct SrosUnit;

impl Unit for SrosUnit {
    fn device(&self) -> Device {
        Device::Sros
    }

    fn register(&self, builder: &mut RegistryBuilder) {
        builder.add_writer(pattern(paths::IPSEC_CLIENT_CONFIG), ClientConfigWriter);
    }

    fn error_patterns(&self) -> &'static [&'static str] {
        &[r"^MINOR:", r"^MAJOR:", r"^CRITICAL:", r"^Error:"]
    }
}
