use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Why a player action was a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ActionRejection {
    NoActiveGame,
    NotYourSide,
    NoStateRolled,
    CategoryAlreadyUsed { category: String },
    UnknownCategory { category: String },
    NoRanking { category: String, state: String },
    NoStatesAvailable,
    SideComplete,
    RoundComplete,
    InviteSelf,
    InvitationNotFound { invitation_id: i32 },
    InvitationExpired { invitation_id: i32 },
    InvitationNotPending { invitation_id: i32 },
    NotInvited { invitation_id: i32 },
    NotAParticipant { game_id: i32 },
    GameNotFound { game_id: i32 },
    UnknownRoom { name: String },
}

impl std::fmt::Display for ActionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionRejection::NoActiveGame => write!(f, "no active game"),
            ActionRejection::NotYourSide => write!(f, "that side belongs to your opponent"),
            ActionRejection::NoStateRolled => write!(f, "roll a state first"),
            ActionRejection::CategoryAlreadyUsed { category } => {
                write!(f, "category {} already used", category)
            }
            ActionRejection::UnknownCategory { category } => {
                write!(f, "unknown category {}", category)
            }
            ActionRejection::NoRanking { category, state } => {
                write!(f, "no {} ranking for {}", category, state)
            }
            ActionRejection::NoStatesAvailable => write!(f, "no more states available"),
            ActionRejection::SideComplete => write!(f, "all categories already used"),
            ActionRejection::RoundComplete => write!(f, "round already complete"),
            ActionRejection::InviteSelf => write!(f, "you cannot challenge yourself"),
            ActionRejection::InvitationNotFound { invitation_id } => {
                write!(f, "invitation {} not found", invitation_id)
            }
            ActionRejection::InvitationExpired { invitation_id } => {
                write!(f, "invitation {} expired", invitation_id)
            }
            ActionRejection::InvitationNotPending { invitation_id } => {
                write!(f, "invitation {} was already answered", invitation_id)
            }
            ActionRejection::NotInvited { invitation_id } => {
                write!(f, "invitation {} is addressed to someone else", invitation_id)
            }
            ActionRejection::NotAParticipant { game_id } => {
                write!(f, "you are not part of game {}", game_id)
            }
            ActionRejection::GameNotFound { game_id } => write!(f, "game {} not found", game_id),
            ActionRejection::UnknownRoom { name } => write!(f, "unknown room {}", name),
        }
    }
}

impl std::error::Error for ActionRejection {}
