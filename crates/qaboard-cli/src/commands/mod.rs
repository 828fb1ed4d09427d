pub mod serve;
pub mod tree;
pub mod version;
pub mod workitems;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

/// Print a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{out}");
    Ok(())
}
