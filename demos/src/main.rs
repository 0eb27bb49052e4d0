use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::LazyLock;

use clap::{Parser, ValueEnum};
use regex::Regex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zodkit_core::{
    Locale, ParseContext, Schema, Value, array, coerce, enumeration, int, object, record, string,
    union, update_config,
};

static ZIP_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("static regex must compile"));

/// Built-in schemas the demo can validate against.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaName {
    /// A sign-up form with nested address and tags.
    Signup,
    /// An order with coerced quantities and a price table.
    Order,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ErrorFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "zodkit-demo")]
#[command(about = "Validate a JSON document against a built-in schema")]
struct Cli {
    /// Schema to validate against.
    #[arg(long, value_enum, default_value = "signup")]
    schema: SchemaName,
    /// JSON input file; reads stdin when omitted or `-`.
    input: Option<PathBuf>,
    /// YAML message catalog replacing the English messages.
    #[arg(long)]
    locale: Option<PathBuf>,
    /// How to print validation errors.
    #[arg(long, value_enum, default_value = "pretty")]
    errors: ErrorFormat,
    /// Leave inputs out of reported issues.
    #[arg(long)]
    hide_input: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    }
}

fn signup_schema() -> Schema {
    let address = object([
        ("street", string().trim().min(1)),
        ("zip", string().regex(ZIP_CODE.clone())),
    ]);
    object([
        ("email", string().trim().to_lowercase().email()),
        ("age", int().gte(13).optional()),
        ("plan", enumeration(&["free", "pro"]).default("free")),
        ("address", address),
        ("tags", array(string().min(1)).max(5).default(Value::Array(Vec::new()))),
    ])
    .strict()
}

fn order_schema() -> Schema {
    let line = object([
        ("sku", string().starts_with("SKU-")),
        ("quantity", coerce::int().positive()),
    ]);
    object([
        ("id", union([string().uuid(), int().positive()])),
        ("lines", array(line).nonempty()),
        ("prices", record(string(), coerce::float64().nonnegative())),
    ])
}

/// Returns whether the document was valid.
fn run(cli: Cli) -> Result<bool, String> {
    if let Some(path) = &cli.locale {
        let locale = Locale::load(path)
            .map_err(|err| format!("Failed to load locale '{}': {err}", path.display()))?;
        info!(locale = locale.name(), "Using message catalog");
        update_config(|config| config.locale = locale);
    }

    let text = match cli.input.as_deref() {
        None => read_stdin()?,
        Some(path) if path.as_os_str() == "-" => read_stdin()?,
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display()))?,
    };
    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|err| format!("Invalid JSON: {err}"))?;

    let schema = match cli.schema {
        SchemaName::Signup => signup_schema(),
        SchemaName::Order => order_schema(),
    };
    let ctx = if cli.hide_input {
        ParseContext::new().without_input()
    } else {
        ParseContext::new()
    };

    match schema.parse_with(Value::from(json), &ctx) {
        Ok(value) => {
            let pretty = serde_json::to_string_pretty(&value.to_json())
                .map_err(|err| format!("Failed to render output: {err}"))?;
            println!("{pretty}");
            Ok(true)
        }
        Err(err) => {
            match cli.errors {
                ErrorFormat::Pretty => eprintln!("{}", err.format_pretty()),
                ErrorFormat::Json => {
                    let rendered = serde_json::to_string_pretty(&err.to_json())
                        .map_err(|e| format!("Failed to render errors: {e}"))?;
                    println!("{rendered}");
                }
            }
            Ok(false)
        }
    }
}

fn read_stdin() -> Result<String, String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(text: &str) -> Value {
        Value::from(serde_json::from_str::<serde_json::Value>(text).unwrap())
    }

    #[test]
    fn test_signup_fills_defaults() {
        let input = json(
            r#"{"email": " Ada@Example.com ", "address": {"street": "Main", "zip": "12345"}}"#,
        );
        let out = signup_schema().parse(input).unwrap();
        let out = out.as_map().unwrap();
        assert_eq!(out["email"], Value::from("ada@example.com"));
        assert_eq!(out["plan"], Value::from("free"));
        assert_eq!(out["tags"], Value::Array(Vec::new()));
    }

    #[test]
    fn test_signup_reports_nested_paths() {
        let input = json(r#"{"email": "nope", "address": {"street": "", "zip": "1"}, "x": 1}"#);
        let err = signup_schema().parse(input).unwrap_err();
        let paths: Vec<_> = err
            .issues()
            .iter()
            .map(|issue| zodkit_core::format_path(&issue.path))
            .collect();
        assert_eq!(paths, ["email", "address.street", "address.zip", ""]);
    }

    #[test]
    fn test_order_coerces_quantities() {
        let input = json(
            r#"{"id": 7, "lines": [{"sku": "SKU-1", "quantity": "3"}], "prices": {"SKU-1": "9.5"}}"#,
        );
        let out = order_schema().parse(input).unwrap();
        let lines = out.as_map().unwrap()["lines"].as_array().unwrap().clone();
        assert_eq!(lines[0].as_map().unwrap()["quantity"], Value::Int(3));
    }
}
