// check.rs - Guard assertions from the command line.

use cadence_authz::{Action, Authorizing, UserId};
use clap::Subcommand;
use serde::Serialize;

use super::{fail, Output};

#[derive(Subcommand)]
pub enum CheckCommands {
    /// Fail if USER is denied ACTION.
    Action { user: UserId, action: Action },
    /// Fail unless AUTHORIZER controls AUTHORIZEE.
    Control {
        authorizer: UserId,
        authorizee: UserId,
    },
}

#[derive(Serialize)]
struct Passed<'a> {
    check: &'a str,
    passed: bool,
}

pub fn execute(cmd: &CheckCommands, authz: &Authorizing, out: &Output) -> anyhow::Result<()> {
    let guard = authz.guard();
    let check = match cmd {
        CheckCommands::Action { user, action } => {
            guard.assert_action_allowed(user, *action).map_err(fail)?;
            "action"
        }
        CheckCommands::Control {
            authorizer,
            authorizee,
        } => {
            guard
                .assert_is_authorizer(authorizer, authorizee)
                .map_err(fail)?;
            "control"
        }
    };
    out.emit(
        &Passed {
            check,
            passed: true,
        },
        || "OK".to_string(),
    )
}
