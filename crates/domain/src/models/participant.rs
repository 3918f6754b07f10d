//! Participant view models.
//!
//! Participants are derived on every read and never stored.

use serde::Serialize;

use super::user::UserProfile;

/// How a participant came to have access to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Creator,
    Accepted,
}

/// One entry of a resource's participant list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub email: String,
    pub display_name: String,
    pub role: ParticipantRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invited_by_name: Option<String>,
}

impl Participant {
    pub fn creator(owner: &UserProfile) -> Self {
        Self {
            email: owner.email.clone(),
            display_name: owner.display_name().to_string(),
            role: ParticipantRole::Creator,
            invited_by_name: None,
        }
    }
}

/// Response for listing participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListParticipantsResponse {
    pub data: Vec<Participant>,
}
