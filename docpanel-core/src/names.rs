//! Database and collection name checks
//!
//! Names arrive straight from HTTP requests and end up as directory and file
//! names in the file store, so they are checked against a conservative
//! pattern before any store call: `[A-Za-z0-9_][A-Za-z0-9_.-]{0,119}`, no
//! `..`, no `system.` prefix.

use crate::error::{PanelError, Result};

/// Databases the store keeps for itself; hidden from the catalog and never written
pub const SYSTEM_DATABASES: [&str; 3] = ["admin", "local", "config"];

const MAX_NAME_LEN: usize = 120;

pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name)
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(PanelError::validation(format!("{} name is required", kind)));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(PanelError::validation(format!(
            "{} name longer than {} characters",
            kind, MAX_NAME_LEN
        )));
    }

    let mut chars = name.chars();
    let first_ok = chars
        .next()
        .map(|c| c.is_ascii_alphanumeric() || c == '_')
        .unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if !first_ok || !rest_ok || name.contains("..") {
        return Err(PanelError::validation(format!(
            "invalid {} name '{}'",
            kind, name
        )));
    }
    if name.starts_with("system.") {
        return Err(PanelError::validation(format!(
            "{} name '{}' is reserved",
            kind, name
        )));
    }
    Ok(())
}

pub fn validate_collection_name(name: &str) -> Result<()> {
    check_name("collection", name)
}

/// Database names readable by the gateway
pub fn validate_database_name(name: &str) -> Result<()> {
    check_name("database", name)
}

/// Database names the gateway may write to: valid and not a system database
pub fn validate_writable_database(name: &str) -> Result<()> {
    validate_database_name(name)?;
    if is_system_database(name) {
        return Err(PanelError::validation(format!(
            "database '{}' is a system database",
            name
        )));
    }
    Ok(())
}
