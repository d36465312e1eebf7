//! Committee votes and majority tallies.

use crate::instance::Workflow;
use crate::transition::Action;
use chrono::{DateTime, Utc};
use docflow_core::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A decision a committee participant can vote for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Forward,
    Revert,
    Approve,
    Reject,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Action::from(*self).as_str())
    }
}

impl From<Decision> for Action {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Forward => Action::Forward,
            Decision::Revert => Action::Revert,
            Decision::Approve => Action::Approve,
            Decision::Reject => Action::Reject,
        }
    }
}

/// One participant's vote on one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: UserId,
    pub stage_index: usize,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub cast_at: DateTime<Utc>,
}

/// Vote counts for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub stage_index: usize,
    pub counts: BTreeMap<Decision, usize>,
}

impl Tally {
    /// Total number of votes counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Returns the count for one decision.
    #[must_use]
    pub fn count(&self, decision: Decision) -> usize {
        self.counts.get(&decision).copied().unwrap_or(0)
    }

    /// Returns the decision with strictly the most votes.
    ///
    /// `None` when there are no votes or the top count is shared.
    #[must_use]
    pub fn leader(&self) -> Option<Decision> {
        let top = self.counts.values().copied().max()?;
        let mut leaders = self.counts.iter().filter(|(_, n)| **n == top);
        let (decision, _) = leaders.next()?;
        if leaders.next().is_some() {
            return None;
        }
        Some(*decision)
    }
}

/// Counts the decisions of votes cast for `stage_index`.
#[must_use]
pub fn aggregate_votes(votes: &[Vote], stage_index: usize) -> Tally {
    let mut counts = BTreeMap::new();
    for vote in votes.iter().filter(|v| v.stage_index == stage_index) {
        *counts.entry(vote.decision).or_insert(0) += 1;
    }
    Tally {
        stage_index,
        counts,
    }
}

impl Workflow {
    /// Records a vote on the current stage, replacing any earlier vote by
    /// the same user on that stage.
    pub fn record_vote(&mut self, user_id: UserId, decision: Decision, comment: Option<String>) {
        let stage_index = self.current_stage_index;
        self.votes
            .retain(|v| !(v.user_id == user_id && v.stage_index == stage_index));
        self.votes.push(Vote {
            user_id,
            stage_index,
            decision,
            comment,
            cast_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    /// Tallies the votes of the current stage.
    #[must_use]
    pub fn current_tally(&self) -> Tally {
        aggregate_votes(&self.votes, self.current_stage_index)
    }
}
