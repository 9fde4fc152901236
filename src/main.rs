//! testbanner - standardized test-run banners and shared runtime utilities
//!
//! Prints consistent headers and summaries for test runs in one of three
//! styles (box-drawn text, Markdown, plain text), and bundles the small
//! helpers the test scripts share: prefixed UUIDs, ISO 8601 and epoch-day
//! conversion, secrets, entity hash chains and recurrence rules.
//!
//! ## Usage
//!
//! ```bash
//! # Header and summary, formatter chosen by TEST_FORMAT
//! testbanner header "Core Tests" memogarden-core run-42
//! testbanner summary PASSED 0 57 12.4s run-42
//!
//! # Stand-in for utils/format/<name>.py
//! testbanner format textbox --title "Build" --body "Step: 1" --width 40
//!
//! # Utilities
//! testbanner uid new --core
//! testbanner time day 2026-02-07
//! testbanner rrule expand "FREQ=MONTHLY;BYDAY=2FR" --start 2025-01-01 -n 3
//! ```

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use clap::Parser;
use std::path::Path;
use tracing::{debug, info};

mod cli;
mod config;
mod hashchain;
mod ident;
mod output;
mod recurrence;
mod timefmt;
mod utils;

use cli::{Args, RenderArgs};
use config::file::{get_config_path, ConfigFile, ConfigFormat, DeployVerb};
use config::{BannerSettings, Settings};
use output::{Backend, Document, FormatterKind};
use utils::logger::{init_logger, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let verb = DeployVerb::from_str(&args.verb);
    let settings = if args.command.is_banner() {
        Settings::load_lenient(verb, args.config.as_deref())
    } else {
        Settings::load(verb, args.config.as_deref()).context("Failed to load settings")?
    };

    init_logger(LogLevel::resolve(args.verbose, &settings.log_level));
    settings.report_warnings();
    debug!("Settings resolved for '{}' from {:?}", verb, settings.source);

    match args.command {
        cli::Command::Header {
            title,
            project,
            run_id,
            render,
        } => {
            let renderer = banner_settings(&settings.banner, &render)?.renderer();
            let text = renderer
                .header(&title, &project, &run_id)
                .await
                .context("Failed to render header")?;
            println!("{text}");
        }
        cli::Command::Summary {
            status,
            fail_count,
            pass_count,
            duration,
            run_id,
            render,
        } => {
            let renderer = banner_settings(&settings.banner, &render)?.renderer();
            let text = renderer
                .summary(&status, &fail_count, &pass_count, &duration, &run_id)
                .await
                .context("Failed to render summary")?;
            println!("{text}");
        }
        cli::Command::Formatter { name, path, list } => {
            show_formatter(&settings.banner, name.as_deref(), path, list);
        }
        cli::Command::Format(format_args) => {
            let kind = FormatterKind::from_name(&format_args.name);
            let doc = Document {
                title: format_args.title,
                body: format_args.body,
            };
            let width = format_args.width.unwrap_or(settings.banner.width);
            println!("{}", kind.render(&doc, width));
        }
        cli::Command::Uid { action } => manage_uid(action)?,
        cli::Command::Time { action } => manage_time(action)?,
        cli::Command::Secret { action } => manage_secret(action)?,
        cli::Command::Hash { action } => manage_hash(action)?,
        cli::Command::Rrule { action } => manage_rrule(action)?,
        cli::Command::Config { action } => {
            manage_config(action, &settings, verb, args.config.as_deref())?
        }
    }

    Ok(())
}

/// Banner settings with command-line overrides applied
fn banner_settings(base: &BannerSettings, render: &RenderArgs) -> Result<BannerSettings> {
    let mut banner = base.clone();

    if let Some(width) = render.width {
        banner.width = width;
    }
    if let Some(format) = &render.format {
        banner.format = FormatterKind::from_name(format);
    }
    if let Some(backend) = &render.backend {
        banner.backend = Backend::from_str(backend)
            .ok_or_else(|| anyhow::anyhow!("Unknown backend: {backend}. Use 'builtin' or 'script'."))?;
    }
    if let Some(root) = &render.script_root {
        banner.script_root = Some(root.clone());
    }

    Ok(banner)
}

fn show_formatter(banner: &BannerSettings, name: Option<&str>, path: bool, list: bool) {
    let root = banner.script_root.as_deref();

    if list {
        for kind in FormatterKind::all() {
            println!("  {:10} {}", kind.name(), kind.script_path(root).display());
        }
        return;
    }

    let kind = name.map(FormatterKind::from_name).unwrap_or(banner.format);
    if path {
        println!("{}", kind.script_path(root).display());
    } else {
        println!("{kind}");
    }
}

fn manage_uid(action: cli::UidAction) -> Result<()> {
    use ident::uid;

    match action {
        cli::UidAction::New { core, soil } => {
            let id = uid::generate_uuid();
            let id = if core {
                uid::add_core_prefix(&id)
            } else if soil {
                uid::add_soil_prefix(&id)
            } else {
                id
            };
            println!("{id}");
        }
        cli::UidAction::Prefix { id, kind } => {
            let prefixed = match kind.to_lowercase().as_str() {
                "core" => uid::add_core_prefix(&id),
                "soil" => uid::add_soil_prefix(&id),
                _ => anyhow::bail!("Unknown prefix kind: {kind}. Use 'core' or 'soil'."),
            };
            println!("{prefixed}");
        }
        cli::UidAction::Strip { id } => println!("{}", uid::strip_prefix(&id)),
        cli::UidAction::Check { id } => {
            let kind = if uid::has_core_prefix(&id) {
                "core"
            } else if uid::has_soil_prefix(&id) {
                "soil"
            } else {
                "none"
            };
            println!("{kind}");
        }
    }

    Ok(())
}

fn manage_time(action: cli::TimeAction) -> Result<()> {
    use timefmt::{epoch, iso};

    match action {
        cli::TimeAction::Now { unix } => {
            if unix {
                println!("{}", iso::now_unix());
            } else {
                println!("{}", iso::now());
            }
        }
        cli::TimeAction::Parse { timestamp, unix } => {
            let dt = iso::to_datetime(&timestamp)?;
            if unix {
                println!("{}", iso::to_unix_timestamp(&dt));
            } else {
                println!("{}", iso::to_timestamp(&dt));
            }
        }
        cli::TimeAction::FromUnix { seconds } => {
            println!("{}", iso::to_timestamp(&iso::from_unix_timestamp(seconds)?));
        }
        cli::TimeAction::Day { date } => {
            let day = match date {
                Some(date) => {
                    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date: {date}. Expected YYYY-MM-DD"))?;
                    epoch::date_to_day(&date)
                }
                None => epoch::current_day(),
            };
            println!("{day}");
        }
        cli::TimeAction::Date { day } => {
            println!("{}", iso::to_datestring(&epoch::day_to_date(day)?));
        }
    }

    Ok(())
}

fn manage_secret(action: cli::SecretAction) -> Result<()> {
    use ident::secret::{self, ApiKeyType};

    match action {
        cli::SecretAction::Uuid => println!("{}", secret::generate_uuid()),
        cli::SecretAction::ApiKey { kind, show_prefix } => {
            let kind = ApiKeyType::from_str(&kind)
                .ok_or_else(|| anyhow::anyhow!("Unknown API key type: {kind}"))?;
            let key = secret::generate_api_key(kind);
            println!("{key}");
            if show_prefix {
                println!("{}", secret::api_key_prefix(&key));
            }
        }
        cli::SecretAction::Token { bytes } => println!("{}", secret::generate_token(bytes)),
        cli::SecretAction::Password { length } => {
            println!("{}", secret::generate_password(length))
        }
    }

    Ok(())
}

fn manage_hash(action: cli::HashAction) -> Result<()> {
    use hashchain::EntityState;

    match action {
        cli::HashAction::Row { json } => {
            let row: serde_json::Value =
                serde_json::from_str(&json).context("Row must be a JSON object")?;
            println!("{}", hashchain::compute_entity_hash_from_row(&row)?);
        }
        cli::HashAction::Next { json, current_hash } => {
            let state: EntityState =
                serde_json::from_str(&json).context("Row must be a JSON object")?;
            println!("{}", hashchain::compute_next_hash(&state, &current_hash));
        }
        cli::HashAction::Verify { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let states: Vec<EntityState> = match ConfigFormat::for_path(&file) {
                ConfigFormat::Yaml => serde_yaml::from_str(&content)?,
                _ => serde_json::from_str(&content)?,
            };
            hashchain::verify_chain(&states)?;
            info!("Verified {} states in {}", states.len(), file.display());
            println!("✓ Chain intact ({} states)", states.len());
        }
    }

    Ok(())
}

/// ISO 8601 argument as naive UTC, or now
fn naive_utc(value: Option<&str>) -> Result<NaiveDateTime> {
    match value {
        Some(s) => Ok(timefmt::iso::to_utc(s)?.naive_utc()),
        None => Ok(Utc::now().naive_utc()),
    }
}

fn manage_rrule(action: cli::RruleAction) -> Result<()> {
    use timefmt::iso::naive_to_timestamp;

    match action {
        cli::RruleAction::Validate { rule } => {
            if recurrence::validate_rrule(&rule) {
                println!("✓ Valid: {rule}");
            } else {
                let reason = recurrence::RecurrenceRule::parse(&rule)
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                anyhow::bail!("Invalid RRULE: {rule} ({reason})");
            }
        }
        cli::RruleAction::Expand {
            rule,
            start,
            end,
            count,
        } => {
            let start = naive_utc(start.as_deref())?;
            let end = end.as_deref().map(|e| naive_utc(Some(e))).transpose()?;
            for occurrence in recurrence::generate_occurrences(&rule, start, end, count)? {
                println!("{}", naive_to_timestamp(&occurrence));
            }
        }
        cli::RruleAction::Next { rule, after } => {
            let after = naive_utc(after.as_deref())?;
            match recurrence::get_next_occurrence(&rule, after)? {
                Some(next) => println!("{}", naive_to_timestamp(&next)),
                None => println!("none"),
            }
        }
        cli::RruleAction::Describe { rule } => {
            println!("{}", recurrence::rrule_to_description(&rule)?);
        }
        cli::RruleAction::Window {
            valid_from,
            valid_until,
        } => {
            let valid = recurrence::is_valid_recurrence_window(&valid_from, valid_until.as_deref())?;
            println!("{valid}");
        }
    }

    Ok(())
}

fn manage_config(
    action: cli::ConfigAction,
    settings: &Settings,
    verb: DeployVerb,
    config_override: Option<&Path>,
) -> Result<()> {
    match action {
        cli::ConfigAction::Show { format, env } => {
            if env {
                config::env::EnvConfig::load().print_summary();
            } else {
                let format = ConfigFormat::from_str(&format)
                    .ok_or_else(|| anyhow::anyhow!("Unknown format: {format}. Use toml, yaml or json."))?;
                match &settings.source {
                    Some(path) => println!("# Loaded from {}", path.display()),
                    None => println!("# No config file loaded"),
                }
                println!("{}", format.serialize(settings)?);
            }
        }
        cli::ConfigAction::Init { output, force } => {
            let path = output.unwrap_or_else(|| get_config_path(verb, config_override));
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    path.display()
                );
            }

            ConfigFile::example().save(&path)?;
            println!("✓ Configuration file created: {}", path.display());
        }
        cli::ConfigAction::Get { key } => match settings.get(&key) {
            Some(value) => println!("{value}"),
            None => anyhow::bail!("Unknown configuration key: {key}"),
        },
        cli::ConfigAction::Path => {
            println!("{}", get_config_path(verb, config_override).display());
        }
        cli::ConfigAction::Env => config::env::print_env_help(),
    }

    Ok(())
}
