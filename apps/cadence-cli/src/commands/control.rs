// control.rs - Control subcommands: grant, revoke, list.

use cadence_authz::{Authorizing, Confirmation, UserId};
use clap::Subcommand;

use super::{fail, Output};

#[derive(Subcommand)]
pub enum ControlCommands {
    /// Let AUTHORIZER manage AUTHORIZEE's denials.
    Grant {
        authorizer: UserId,
        authorizee: UserId,
    },
    /// Remove AUTHORIZER's control over AUTHORIZEE.
    Revoke {
        authorizer: UserId,
        authorizee: UserId,
    },
    /// Show who controls a user and whom the user controls.
    List { user: UserId },
}

pub fn execute(cmd: &ControlCommands, authz: &Authorizing, out: &Output) -> anyhow::Result<()> {
    match cmd {
        ControlCommands::Grant {
            authorizer,
            authorizee,
        } => {
            let edge = authz.graph().grant(authorizer, authorizee).map_err(fail)?;
            let confirmation = Confirmation::control_given(edge);
            out.emit(&confirmation, || {
                format!(
                    "{} ({} now manages {})",
                    confirmation.msg(),
                    authorizer,
                    authorizee
                )
            })
        }
        ControlCommands::Revoke {
            authorizer,
            authorizee,
        } => {
            authz.graph().revoke(authorizer, authorizee).map_err(fail)?;
            let confirmation =
                Confirmation::control_revoked(authorizer.clone(), authorizee.clone());
            out.emit(&confirmation, || confirmation.msg().to_string())
        }
        ControlCommands::List { user } => {
            let summary = authz.control_summary(user).map_err(fail)?;
            out.emit(&summary, || {
                let join = |users: &[UserId]| {
                    if users.is_empty() {
                        "(none)".to_string()
                    } else {
                        users
                            .iter()
                            .map(UserId::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    }
                };
                format!(
                    "Managed by: {}\nManages:    {}",
                    join(&summary.authorizers),
                    join(&summary.authorizees)
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_twice_then_revoke_twice() {
        let authz = Authorizing::in_memory();
        let out = Output::new(false);
        let grant = ControlCommands::Grant {
            authorizer: UserId::from("bob"),
            authorizee: UserId::from("alice"),
        };
        execute(&grant, &authz, &out).unwrap();
        let err = execute(&grant, &authz, &out).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bob already has authorization permission access over alice!"
        );

        let revoke = ControlCommands::Revoke {
            authorizer: UserId::from("bob"),
            authorizee: UserId::from("alice"),
        };
        execute(&revoke, &authz, &out).unwrap();
        let err = execute(&revoke, &authz, &out).unwrap_err();
        assert_eq!(err.to_string(), "Authorization from bob to alice does not exist!");

        let list = ControlCommands::List {
            user: UserId::from("alice"),
        };
        execute(&list, &authz, &out).unwrap();
    }
}
