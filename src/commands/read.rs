//! `clitrans read`: parse a recorded session into a configuration tree.

use crate::Context;
use crate::cli::{OutputFormat, ReadArgs};
use crate::commands::{resolve_device, transaction_options};
use crate::transcript::{ReplayChannel, Transcript};
use crate::ui;
use anyhow::{Context as _, Result};
use serde_json::Value;
use translate::{Channel, ConfigPath, Registry, Snapshot, Transaction, TransactionOptions};

pub fn run(ctx: &Context, args: &ReadArgs) -> Result<()> {
    let device = resolve_device(args.device.as_deref(), &ctx.config)?;
    let path: ConfigPath = args.path.parse()?;
    let transcript_path = ctx.config.transcript_path(&args.transcript);
    let channel = ReplayChannel::new(Transcript::load(&transcript_path)?);

    let registry = units::registry_for(device)?;
    let options = transaction_options(device, args.jobs.unwrap_or(ctx.config.jobs))?;
    log::info!("Reading {path} as {device} from {}", transcript_path.display());

    let Some(tree) = read_tree(&registry, &channel, options, &path)? else {
        ui::warn(&format!("{path} does not exist on the device"));
        return Ok(());
    };

    println!("{}", render(&tree, args.format)?);

    let missed = channel.missed();
    if !missed.is_empty() && !ctx.quiet {
        ui::warn(&format!(
            "{} not in transcript, read as empty:",
            ui::plural(missed.len(), "command", "commands")
        ));
        for command in missed {
            ui::dim(&command);
        }
    }
    Ok(())
}

fn read_tree(
    registry: &Registry,
    channel: &dyn Channel,
    options: TransactionOptions,
    path: &ConfigPath,
) -> Result<Option<Snapshot>> {
    let tx = Transaction::new(registry, channel).with_options(options);
    let tree = tx
        .read_tree(path)
        .with_context(|| format!("Failed to read {path}"))?;
    log::debug!("{} command(s) answered from cache", tx.cache().hits());
    Ok(tree)
}

fn render(tree: &Snapshot, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(tree.as_value())?),
        OutputFormat::Toml => {
            // TOML has no null and needs a table at the top
            let value = strip_nulls(tree.as_value().clone());
            let table = match value {
                Value::Object(_) => value,
                other => serde_json::json!({ "value": other }),
            };
            toml::to_string_pretty(&table).context("Tree cannot be rendered as TOML")
        }
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
