//! `clitrans plan`: render a change list without touching the device.

use crate::Context;
use crate::cli::PlanArgs;
use crate::commands::{explain, load_changes, resolve_device};
use crate::transcript::ReplayChannel;
use crate::ui;
use anyhow::Result;
use colored::{ColoredString, Colorize};
use similar::{ChangeTag, TextDiff};
use translate::{Change, Plan, Snapshot, Transaction, field_changes};

pub fn run(ctx: &Context, args: &PlanArgs) -> Result<()> {
    let device = resolve_device(args.device.as_deref(), &ctx.config)?;
    let changes = load_changes(&args.changes)?;
    let registry = units::registry_for(device)?;

    // Planning never reads or writes; the channel only satisfies the transaction
    let channel = ReplayChannel::default();
    let tx = Transaction::new(&registry, &channel);
    let plan = match tx.plan(&changes) {
        Ok(plan) => plan,
        Err(err) => {
            explain(&err);
            anyhow::bail!("Planning failed, nothing would be sent");
        }
    };

    if args.raw {
        print!("{}", plan.to_text());
        return Ok(());
    }

    if !ctx.quiet {
        ui::header(&format!("Plan for {device}"));
    }
    print_plan(ctx, &plan);
    Ok(())
}

/// Colored marker of a change kind
pub fn marker(change: Change) -> ColoredString {
    match change {
        Change::Create => "+".green().bold(),
        Change::Update => "~".yellow().bold(),
        Change::Delete => "-".red().bold(),
        Change::Noop => "=".dimmed(),
    }
}

fn print_plan(ctx: &Context, plan: &Plan) {
    for write in &plan.writes {
        println!();
        println!(
            "{} {} {}",
            marker(write.change),
            write.change,
            write.path.to_string().bold()
        );

        if ctx.verbose > 0 {
            for field in field_changes(write.before.as_ref(), write.after.as_ref()) {
                let values = format!(
                    "{} → {}",
                    show(field.before.as_ref()),
                    show(field.after.as_ref())
                );
                ui::kv(&field.name, &values);
            }
        }
        for line in snapshot_diff(write.before.as_ref(), write.after.as_ref()) {
            println!("    {line}");
        }

        if write.commands.is_empty() {
            ui::dim("(no commands)");
        }
        for line in write.commands.lines() {
            println!("    {}", line.cyan());
        }
    }

    println!();
    let batches = plan.writes.iter().filter(|w| !w.commands.is_empty()).count();
    let unchanged = plan.unchanged + plan.writes.len() - batches;
    if plan.is_empty() {
        ui::info(&format!("Nothing to send ({unchanged} unchanged)"));
    } else {
        ui::info(&format!(
            "{} to send, {unchanged} unchanged",
            ui::plural(batches, "batch", "batches")
        ));
    }
}

fn show(value: Option<&serde_json::Value>) -> String {
    value.map_or_else(|| "(unset)".to_string(), ToString::to_string)
}

fn pretty(snapshot: Option<&Snapshot>) -> String {
    snapshot
        .and_then(|s| serde_json::to_string_pretty(s.as_value()).ok())
        .map(|text| text + "\n")
        .unwrap_or_default()
}

/// Line diff of the pretty-printed before and after states
fn snapshot_diff(before: Option<&Snapshot>, after: Option<&Snapshot>) -> Vec<String> {
    let old = pretty(before);
    let new = pretty(after);
    TextDiff::from_lines(&old, &new)
        .iter_all_changes()
        .filter(|change| change.tag() != ChangeTag::Equal || (before.is_some() && after.is_some()))
        .map(|change| {
            let line = change.value().trim_end_matches('\n');
            match change.tag() {
                ChangeTag::Delete => format!("- {line}").red().to_string(),
                ChangeTag::Insert => format!("+ {line}").green().to_string(),
                ChangeTag::Equal => format!("  {line}").dimmed().to_string(),
            }
        })
        .collect()
}
