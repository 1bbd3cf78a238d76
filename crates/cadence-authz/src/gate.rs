// gate.rs - Requirement lists for the app's gated domain operations.
//
// Each domain entry point (create a post, send a message, schedule a nudge,
// log a record, toggle automatic recording) calls
// `Guard::assert_operation` with the matching `Operation` before touching
// its own store. Keeping the table here makes the gating of every operation
// visible in one place and testable without the domain stores.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::AuthzError;
use crate::identity::UserId;

/// A gated domain operation and the accounts it involves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum Operation {
    CreatePost { author: UserId },
    EditPost { author: UserId },
    DeletePost { author: UserId },

    /// Both ends of a conversation must be allowed to message.
    SendMessage { sender: UserId, receiver: UserId },
    DeleteMessage { sender: UserId },

    /// A nudge reminds the receiver to message, so the receiver needs both.
    ScheduleNudge { sender: UserId, receiver: UserId },
    /// `receiver: None` schedules reminders for the sender themself.
    SchedulePeriodicNudges {
        sender: UserId,
        receiver: Option<UserId>,
    },
    DeleteNudge { sender: UserId },

    CreateRecord { user: UserId },
    DeleteRecord { user: UserId },

    StartAutomaticRecording { user: UserId, tracked: Tracked },
    StopAutomaticRecording { user: UserId, tracked: Tracked },
}

/// The actions whose use can be recorded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tracked {
    Post,
    Message,
}

impl Tracked {
    pub fn action(self) -> Action {
        match self {
            Tracked::Post => Action::Post,
            Tracked::Message => Action::Message,
        }
    }
}

impl From<Tracked> for Action {
    fn from(tracked: Tracked) -> Self {
        tracked.action()
    }
}

impl TryFrom<Action> for Tracked {
    type Error = AuthzError;

    fn try_from(action: Action) -> Result<Self, Self::Error> {
        match action {
            Action::Post => Ok(Tracked::Post),
            Action::Message => Ok(Tracked::Message),
            Action::Nudge | Action::Record => Err(AuthzError::NotTrackable { action }),
        }
    }
}

impl Operation {
    /// Build a start/stop automatic-recording operation.
    pub fn automatic_recording(user: UserId, tracked: Tracked, start: bool) -> Self {
        if start {
            Operation::StartAutomaticRecording { user, tracked }
        } else {
            Operation::StopAutomaticRecording { user, tracked }
        }
    }

    /// The `(subject, action)` pairs that must all be allowed, in check order.
    pub fn requirements(&self) -> Vec<(&UserId, Action)> {
        match self {
            Operation::CreatePost { author }
            | Operation::EditPost { author }
            | Operation::DeletePost { author } => vec![(author, Action::Post)],

            Operation::SendMessage { sender, receiver } => {
                vec![(sender, Action::Message), (receiver, Action::Message)]
            }
            Operation::DeleteMessage { sender } => vec![(sender, Action::Message)],

            Operation::ScheduleNudge { sender, receiver } => vec![
                (sender, Action::Nudge),
                (receiver, Action::Nudge),
                (receiver, Action::Message),
            ],
            Operation::SchedulePeriodicNudges { sender, receiver } => {
                let mut checks = Vec::with_capacity(4);
                if let Some(receiver) = receiver {
                    checks.push((receiver, Action::Nudge));
                    checks.push((receiver, Action::Message));
                }
                checks.push((sender, Action::Nudge));
                checks.push((sender, Action::Message));
                checks
            }
            Operation::DeleteNudge { sender } => vec![(sender, Action::Nudge)],

            Operation::CreateRecord { user } | Operation::DeleteRecord { user } => {
                vec![(user, Action::Record)]
            }

            Operation::StartAutomaticRecording { user, tracked }
            | Operation::StopAutomaticRecording { user, tracked } => {
                vec![(user, Action::Record), (user, tracked.action())]
            }
        }
    }
}
