//! Agent credential presence probe.
//!
//! The bridge never parses the Claude CLI's credential file — it only checks
//! that one exists and is readable, the same way the original `claudecodeui`
//! credential gate worked. Parsing the file is the agent's job.

use std::path::PathBuf;

const CREDENTIALS_RELATIVE_PATH: &str = ".claude/.credentials.json";

/// Returns the path this process expects the Claude CLI's credentials at,
/// or `None` if no home directory can be resolved.
pub fn credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CREDENTIALS_RELATIVE_PATH))
}

/// Whether the Claude CLI appears authenticated: the credentials file exists
/// and is readable. No attempt is made to parse or validate its contents.
pub fn agent_is_authenticated() -> bool {
    match credentials_path() {
        Some(path) => std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false),
        None => false,
    }
}
