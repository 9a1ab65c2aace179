//! `clitrans units`: supported devices and what they translate.

use crate::Context;
use crate::commands::resolve_device;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use translate::Registry;
use units::Device;

pub fn run(ctx: &Context, device: Option<&str>) -> Result<()> {
    match device {
        Some(name) => show_device(ctx, resolve_device(Some(name), &ctx.config)?),
        None => list_devices(ctx),
    }
}

fn list_devices(ctx: &Context) -> Result<()> {
    if !ctx.quiet {
        ui::header("Supported devices");
    }
    for device in Device::all() {
        let registry = units::registry_for(*device)?;
        let marker = if ctx.config.default_device.as_deref() == Some(device.name()) {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<10} {}{}",
            device.name().bold(),
            format!(
                "{}, {}",
                ui::plural(registry.reader_patterns().len(), "reader", "readers"),
                ui::plural(registry.write_order().len(), "writer", "writers")
            )
            .dimmed(),
            marker
        );
    }
    Ok(())
}

fn show_device(ctx: &Context, device: Device) -> Result<()> {
    let registry = units::registry_for(device)?;
    if !ctx.quiet {
        ui::header(&format!("{device} unit"));
    }
    for line in describe(&registry) {
        println!("{line}");
    }
    Ok(())
}

/// Readers in registration order, then writers in write order
fn describe(registry: &Registry) -> Vec<String> {
    let mut lines = vec!["Readers:".to_string()];
    lines.extend(
        registry
            .reader_patterns()
            .iter()
            .map(|pattern| format!("  {pattern}")),
    );

    lines.push("Writers (write order):".to_string());
    let order = registry.write_order();
    lines.extend(order.iter().enumerate().map(|(i, pattern)| {
        let subtree = if registry.is_subtree_writer(pattern) {
            " [subtree]"
        } else {
            ""
        };
        format!("  {:>2}. {pattern}{subtree}", i + 1)
    }));
    lines
}
