//! CLI argument definitions.

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::sites::SiteCategory;

/// Top-level CLI parser for `siteledger`.
#[derive(Debug, Parser)]
#[command(name = "siteledger", version, about = "Register Form V-B production and consumption sites")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new site and print the stored record.
    Create {
        /// Site category (`production` or `consumption`).
        category: SiteCategory,
        /// Owning company id.
        #[arg(long)]
        company: Option<String>,
        /// Extra site attribute; values that parse as JSON are stored as JSON.
        #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attribute)]
        attributes: Vec<(String, Value)>,
    },
    /// List a company's sites in one category.
    List {
        /// Site category (`production` or `consumption`).
        category: SiteCategory,
        /// Owning company id.
        #[arg(long)]
        company: String,
    },
    /// Show the id the next site of a category would receive.
    NextId {
        /// Site category (`production` or `consumption`).
        category: SiteCategory,
    },
}

/// Parses `key=value`, keeping the value as JSON when it is valid JSON.
fn parse_attribute(raw: &str) -> Result<(String, Value), String> {
    let (key, value) =
        raw.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("attribute name missing in `{raw}`"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
