//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Rendering and styled status output
//! - This module - Interactive prompts and user input handling

use std::io::{self, Write};

use anyhow::Result;

use crate::domain::{resolve_choice, Selection};
use crate::report::SubmoduleUpdate;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_status, display_submodule_tags,
    display_success, render_bump_result, render_report, OutputFormat,
};

/// Prompts user to choose which tag a submodule should move to.
///
/// Lists the submodule's tags and accepts `s` (suggested, the default on Enter),
/// `l` (latest), `n` (skip) or a 1-based tag number.
///
/// # Returns
/// * `Ok(Selection)` - The interpreted answer; unrecognized input is `Selection::Invalid`
/// * `Err` - If reading stdin fails
pub fn prompt_selection(name: &str, update: &SubmoduleUpdate) -> Result<Selection> {
    display_submodule_tags(name, update);

    print!(
        "Update {} to (s)uggested [{}], latest (l), skip (n), or manual index <number>? [s/l/n/<number>] ",
        name,
        update.suggested_tag.as_deref().unwrap_or("-")
    );
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(resolve_choice(&input, &update.recent_tags))
}
