use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn show(ctx: &Context, explicit: Option<&Path>) -> Result<()> {
    ui::header("Configuration");

    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    println!();
    ui::kv("Config directory", &paths::config_dir()?.display().to_string());
    ui::kv("Config file", &path.display().to_string());
    if !path.exists() {
        ui::dim("Not found, using defaults");
    }

    let config = &ctx.config;
    ui::section("Values");
    ui::kv(
        "default_device",
        config.default_device.as_deref().unwrap_or("(none)"),
    );
    ui::kv("jobs", &config.jobs.to_string());
    ui::kv("timeout_secs", &config.timeout_secs.to_string());
    ui::kv(
        "transcripts_dir",
        &config
            .transcripts_dir
            .as_deref()
            .map_or_else(|| "(none)".to_string(), |d| paths::expand_path(d).display().to_string()),
    );

    ui::section("Exec channel");
    match &config.exec.program {
        Some(program) => {
            ui::kv("program", program);
            ui::kv("args", &config.exec.args.join(" "));
        }
        None => {
            ui::warn("No [exec] program configured; 'clitrans apply' is unavailable");
        }
    }

    println!();
    ui::dim(&format!("Override the directory with {}.", paths::ENV_CONFIG_DIR));
    Ok(())
}
