// denial.rs - deny, allow, and denials subcommands.

use cadence_authz::{Action, Authorizing, Confirmation, UserId};

use super::{fail, Output};

pub fn deny(
    authz: &Authorizing,
    out: &Output,
    user: &UserId,
    action: Action,
    by: Option<&UserId>,
) -> anyhow::Result<()> {
    let record = match by {
        Some(authorizer) => authz.deny_on_behalf(authorizer, user, action),
        None => authz.registry().deny(user, action),
    }
    .map_err(fail)?;

    let confirmation = Confirmation::denied(record);
    out.emit(&confirmation, || {
        format!("{} ({} may not {})", confirmation.msg(), user, action)
    })
}

pub fn allow(
    authz: &Authorizing,
    out: &Output,
    user: &UserId,
    action: Action,
    by: Option<&UserId>,
) -> anyhow::Result<()> {
    let pair = match by {
        Some(authorizer) => authz.allow_on_behalf(authorizer, user, action),
        None => authz.registry().allow(user, action),
    }
    .map_err(fail)?;

    let confirmation = Confirmation::allowed(pair);
    out.emit(&confirmation, || {
        format!("{} ({} may {} again)", confirmation.msg(), user, action)
    })
}

pub fn list(authz: &Authorizing, out: &Output, user: &UserId) -> anyhow::Result<()> {
    let denials = authz.registry().denials_for(user).map_err(fail)?;
    out.emit(&denials, || {
        if denials.is_empty() {
            return format!("{} has no denied actions.", user);
        }
        let mut lines = vec![format!("{} is denied:", user)];
        for d in &denials {
            lines.push(format!(
                "  {:<8} since {}",
                d.action,
                d.denied_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
        lines.join("\n")
    })
}
