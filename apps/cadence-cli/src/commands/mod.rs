// mod.rs - Shared plumbing for CLI subcommands.

pub mod check;
pub mod control;
pub mod denial;

use cadence_authz::{describe, AuthzError, ErrorFamily, Verbatim};
use serde::Serialize;

/// Chooses between human-readable lines and JSON on stdout.
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            println!("{}", human());
        }
        Ok(())
    }
}

/// Turn a core error into a CLI failure. Domain errors are rendered with
/// the presentation templates; infrastructure errors keep their source chain.
pub fn fail(err: AuthzError) -> anyhow::Error {
    match err.family() {
        ErrorFamily::Infrastructure => anyhow::Error::new(err),
        _ => anyhow::anyhow!(describe(&err, &Verbatim)),
    }
}
