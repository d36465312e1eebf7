//! Approval committees.
//!
//! A committee stage is owned jointly by every member and the chairperson:
//! their UserWorkflow index entries are activated and deactivated together,
//! and any of them may vote on the stage.

use chrono::{DateTime, Utc};
use docflow_core::{CommitteeId, UserId};
use serde::{Deserialize, Serialize};

/// A named group of approvers with one chairperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Committee {
    pub id: CommitteeId,
    pub name: String,
    pub members: Vec<UserId>,
    pub chairperson: UserId,
    pub created_at: DateTime<Utc>,
}

impl Committee {
    /// Creates a committee with a generated ID.
    #[must_use]
    pub fn new(name: impl Into<String>, members: Vec<UserId>, chairperson: UserId) -> Self {
        Self {
            id: CommitteeId::new(),
            name: name.into(),
            members,
            chairperson,
            created_at: Utc::now(),
        }
    }

    /// Returns every user who acts for the committee: members in declared
    /// order followed by the chairperson, without duplicates.
    #[must_use]
    pub fn participants(&self) -> Vec<UserId> {
        let mut out = Vec::with_capacity(self.members.len() + 1);
        for user in self.members.iter().chain(std::iter::once(&self.chairperson)) {
            if !out.contains(user) {
                out.push(*user);
            }
        }
        out
    }

    /// Returns true if the user is a member or the chairperson.
    #[must_use]
    pub fn includes(&self, user: UserId) -> bool {
        self.chairperson == user || self.members.contains(&user)
    }
}
