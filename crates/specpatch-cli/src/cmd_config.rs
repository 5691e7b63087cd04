use clap::Subcommand;
use serde_json::Value;
use specpatch_store::Settings;
use std::path::Path;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a setting (e.g. lockUrl, auth.username, indent)
    Set {
        /// Dotted settings key
        key: String,
        /// Value (true/false/number/string)
        value: String,
    },
    /// Print one setting
    Get {
        /// Dotted settings key
        key: String,
    },
    /// List all settings
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, settings_path: &Path) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(settings_path, &key, &value),
        ConfigCmd::Get { key } => get(settings_path, &key),
        ConfigCmd::List => list(settings_path),
    }
}

// ── Command Implementations ──

/// `specpatch config set <key> <value>`
pub fn set(settings_path: &Path, key: &str, value: &str) -> anyhow::Result<()> {
    let mut settings = Settings::load(settings_path)?;
    settings.set(key, value)?;
    settings.save(settings_path)?;
    println!("{key} = {value}");
    Ok(())
}

/// `specpatch config get <key>`
pub fn get(settings_path: &Path, key: &str) -> anyhow::Result<()> {
    let settings = Settings::load(settings_path)?;
    match settings.get(key)? {
        Some(Value::String(s)) => println!("{s}"),
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `specpatch config list`
pub fn list(settings_path: &Path) -> anyhow::Result<()> {
    let settings = Settings::load(settings_path)?;
    let mut lines = Vec::new();
    flatten("", &settings.as_json()?, &mut lines);
    println!("# {}", settings_path.display());
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        Value::String(s) if prefix == "auth.token" && !s.is_empty() => {
            out.push(format!("{prefix} = (hidden)"));
        }
        other => out.push(format!("{prefix} = {other}")),
    }
}
