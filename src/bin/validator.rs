//! Record Validator CLI
//!
//! Demonstration driver for the validation engine: validates JSON records
//! against a built-in user-profile schema and prints the typed instance or
//! the full error report.

use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stricture::{
    Bound, Constraint, EntryCheck, FieldDescriptor, FieldType, FieldValue, LengthCheck,
    RangeCheck, RawValue, Schema,
};

const NAME_PATTERN: &str = "[a-zA-Z]+[a-zA-Z0-9]*";

#[derive(Parser)]
#[command(name = "record-validator")]
#[command(about = "Validate JSON records against the built-in user profile schema")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON record file
    Validate {
        /// Path to a JSON file containing one record object
        file: PathBuf,
    },

    /// List the schema's fields and types
    Fields,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let schema = user_schema()?;

    match cli.command {
        Commands::Validate { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", file.display()))?;

            match schema.validate_json(&value) {
                Ok(instance) => {
                    println!("✅ record is valid");
                    for (name, value) in instance.iter() {
                        println!("  {} = {}", name, value);
                    }
                    Ok(())
                }
                Err(report) => {
                    println!("❌ record is invalid ({} error(s)):", report.len());
                    for error in report.iter() {
                        println!("  └─ {}", error);
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Fields => {
            for descriptor in schema.descriptors() {
                let required = if descriptor.is_required() {
                    "required"
                } else {
                    "optional"
                };
                println!(
                    "{} ({}, {})",
                    descriptor.name(),
                    descriptor.field_type(),
                    required
                );
            }
            Ok(())
        }
    }
}

/// The demonstration schema: a user profile with a bounded id, a patterned
/// name, a windowed signup date, and an optional score container.
fn user_schema() -> stricture::Result<Schema> {
    Schema::builder()
        .field(
            FieldDescriptor::new("id", FieldType::Integer).constraint(Constraint::Range(
                RangeCheck::new()
                    .min(Bound::exclusive(0))
                    .max(Bound::inclusive(100)),
            )),
        )
        .field(
            FieldDescriptor::new("name", FieldType::Text)
                .with_default(FieldValue::Text("John Doe".into()))
                .constraint(Constraint::Length(LengthCheck::between(1, 10)))
                .constraint(Constraint::Pattern(NAME_PATTERN.into())),
        )
        .field(
            FieldDescriptor::new("signup_ts", FieldType::optional(FieldType::Date))
                .before_hook(require_dashed_date)
                .after_hook(require_signup_window),
        )
        .field(
            FieldDescriptor::new("tastes", FieldType::optional(FieldType::KeyedContainer))
                .constraint(Constraint::Entries(
                    EntryCheck::new()
                        .key_pattern(NAME_PATTERN)
                        .key_length(LengthCheck::between(2, 8))
                        .value_range(RangeCheck::closed(0, 100)),
                )),
        )
        .build()
}

/// Structural pre-check: the signup timestamp must be a dashed date string
/// before date parsing is attempted.
fn require_dashed_date(raw: RawValue) -> Result<RawValue, String> {
    let RawValue::Json(serde_json::Value::String(text)) = &raw else {
        return Err("signup_ts must be a string".to_string());
    };
    if text.matches('-').count() != 2 {
        return Err("signup_ts must be a dashed date".to_string());
    }
    Ok(raw)
}

/// The signup window accepted by this deployment.
fn require_signup_window(value: FieldValue) -> Result<FieldValue, String> {
    let FieldValue::Date(date) = &value else {
        return Ok(value);
    };
    let earliest = NaiveDate::from_ymd_opt(2024, 4, 29)
        .ok_or_else(|| "invalid signup window".to_string())?;
    let latest = NaiveDate::from_ymd_opt(2034, 3, 31)
        .ok_or_else(|| "invalid signup window".to_string())?;
    if *date < earliest || *date > latest {
        return Err(format!(
            "signup_ts must be between {} and {}",
            earliest, latest
        ));
    }
    Ok(value)
}
