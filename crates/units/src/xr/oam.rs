//! Ethernet CFM domains and maintenance associations.

use crate::model::{CfmDomainConfig, CfmMaConfig};
use translate::{
    BlockBuilder, CommandSequence, ConfigPath, Error, Frame, Result, WriteContext, Writer,
    ensure_unchanged,
};

/// `/oam/cfm/domains/domain[name]/config`.
///
/// The level is part of the device's domain identity and cannot change.
pub struct CfmDomainWriter;

impl Writer<CfmDomainConfig> for CfmDomainWriter {
    fn create(
        &self,
        _path: &ConfigPath,
        after: &CfmDomainConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(CfmMaWriter::frame(after)).finish_always())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &CfmDomainConfig,
        after: &CfmDomainConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "level", &before.level, &after.level)?;
        Ok(CommandSequence::empty())
    }

    fn delete(
        &self,
        _path: &ConfigPath,
        before: &CfmDomainConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        Ok(BlockBuilder::new(Frame::new(["ethernet cfm"], ["root"]))
            .line(format!("no domain {}", before.domain_name))
            .finish())
    }
}

/// `.../domain[name]/mas/ma[name]/config`, written as a down-MEP service.
///
/// The service is entered through its domain, whose level comes from the
/// domain config of the same transaction.
pub struct CfmMaWriter;

impl CfmMaWriter {
    fn domain_config(path: &ConfigPath) -> Result<ConfigPath> {
        path.cut_at("domain")
            .map(|domain| domain.child("config"))
            .ok_or_else(|| Error::contract(path, "maintenance association outside a domain"))
    }

    fn frame(domain: &CfmDomainConfig) -> Frame {
        Frame::new(
            [
                "ethernet cfm".to_string(),
                format!("domain {} level {}", domain.domain_name, domain.level),
            ],
            ["root"],
        )
    }

    fn missing_domain(path: &ConfigPath) -> Error {
        Error::invalid(path, "CFM domain config is missing for this maintenance association")
    }
}

impl Writer<CfmMaConfig> for CfmMaWriter {
    fn create(
        &self,
        path: &ConfigPath,
        after: &CfmMaConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let domain = ctx
            .after::<CfmDomainConfig>(&Self::domain_config(path)?)?
            .ok_or_else(|| Self::missing_domain(path))?;
        Ok(BlockBuilder::new(Self::frame(&domain))
            .line(format!("service {} down-meps", after.ma_name))
            .finish())
    }

    fn update(
        &self,
        path: &ConfigPath,
        before: &CfmMaConfig,
        after: &CfmMaConfig,
        _ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        ensure_unchanged(path, "ma-name", &before.ma_name, &after.ma_name)?;
        Ok(CommandSequence::empty())
    }

    fn delete(
        &self,
        path: &ConfigPath,
        before: &CfmMaConfig,
        ctx: &WriteContext,
    ) -> Result<CommandSequence> {
        let domain = ctx
            .before::<CfmDomainConfig>(&Self::domain_config(path)?)?
            .ok_or_else(|| Self::missing_domain(path))?;
        Ok(BlockBuilder::new(Self::frame(&domain))
            .line(format!("no service {}", before.ma_name))
            .finish())
    }
}
