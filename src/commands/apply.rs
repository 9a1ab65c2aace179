//! `clitrans apply`: commit a change list through the exec channel.

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::plan::marker;
use crate::commands::{explain, load_changes, resolve_device, transaction_options};
use crate::runner::ProcessChannel;
use crate::transcript::ReplayChannel;
use crate::ui;
use anyhow::Result;
use translate::{Channel, CommitSummary, NodeChange, Registry, Transaction, TransactionOptions};

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let device = resolve_device(args.device.as_deref(), &ctx.config)?;
    let changes = load_changes(&args.changes)?;
    let registry = units::registry_for(device)?;
    let options = transaction_options(device, ctx.config.jobs)?;

    if args.dry_run {
        return dry_run(ctx, &registry, &changes);
    }

    let timeout = args
        .timeout
        .map_or_else(|| ctx.config.timeout(), std::time::Duration::from_secs);
    let channel = ProcessChannel::from_config(&ctx.config, timeout)?;
    if !ctx.quiet {
        ui::header(&format!("Applying to {device}"));
        ui::kv("exec", &channel.command_line());
        ui::kv("changes", &changes.len().to_string());
    }

    match commit(&registry, &channel, options, &changes) {
        Ok(summary) => {
            report(&summary);
            Ok(())
        }
        Err(err) => {
            explain(&err);
            if !err.is_validation() {
                ui::warn("Batches sent before the failure are not rolled back");
            }
            anyhow::bail!("Apply failed");
        }
    }
}

fn commit(
    registry: &Registry,
    channel: &dyn Channel,
    options: TransactionOptions,
    changes: &[NodeChange],
) -> translate::Result<CommitSummary> {
    Transaction::new(registry, channel)
        .with_options(options)
        .commit(changes)
}

fn dry_run(ctx: &Context, registry: &Registry, changes: &[NodeChange]) -> Result<()> {
    let channel = ReplayChannel::default();
    let plan = match Transaction::new(registry, &channel).plan(changes) {
        Ok(plan) => plan,
        Err(err) => {
            explain(&err);
            anyhow::bail!("Planning failed, nothing would be sent");
        }
    };

    if !ctx.quiet {
        ui::header("Dry run");
    }
    let batches: Vec<_> = plan.writes.iter().filter(|w| !w.commands.is_empty()).collect();
    for (i, write) in batches.iter().enumerate() {
        ui::step(
            i + 1,
            batches.len(),
            &format!("{} {} {}", marker(write.change), write.change, write.path),
        );
        for line in write.commands.lines() {
            ui::dim(line);
        }
    }
    ui::info(&format!(
        "Would send {}",
        ui::plural(batches.len(), "batch", "batches")
    ));
    Ok(())
}

fn report(summary: &CommitSummary) {
    if summary.total_changes() == 0 {
        ui::success("Device already up to date");
        return;
    }
    ui::success(&format!(
        "Applied {} in {}",
        ui::plural(summary.total_changes(), "change", "changes"),
        ui::plural(summary.batches, "batch", "batches")
    ));
    ui::kv("created", &summary.created.to_string());
    ui::kv("updated", &summary.updated.to_string());
    ui::kv("deleted", &summary.deleted.to_string());
    ui::kv("unchanged", &summary.unchanged.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use translate::{ErrorKind, MockChannel};
    use units::Device;

    fn vrf_create() -> Vec<NodeChange> {
        serde_json::from_value(json!([
            {"path": "/network-instance[CUST]/config",
             "after": {"name": "CUST", "type": "L3VRF", "route-distinguisher": "65000:1"}}
        ]))
        .unwrap()
    }

    #[test]
    fn test_commit_sends_one_batch() {
        let registry = units::registry_for(Device::Ios).unwrap();
        let channel = MockChannel::new();
        let options = transaction_options(Device::Ios, 1).unwrap();

        let summary = commit(&registry, &channel, options, &vrf_create()).unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.batches, 1);
        assert_eq!(
            channel.executed(),
            ["configure terminal\nip vrf CUST\nrd 65000:1\nend\n"]
        );
    }

    #[test]
    fn test_device_rejection_stops_commit() {
        let registry = units::registry_for(Device::Ios).unwrap();
        let channel = MockChannel::new().with_output(
            "configure terminal\nip vrf CUST\nrd 65000:1\nend\n",
            "% Invalid input detected at '^' marker.\n",
        );
        let options = transaction_options(Device::Ios, 1).unwrap();

        let err = commit(&registry, &channel, options, &vrf_create()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandRejected);
        assert!(!err.is_validation());
    }
}
