//! Stage transition state machine.
//!
//! ```text
//! Pending(i) --forward--> Pending(i+1)     i < N-1
//! Pending(i) --revert---> Pending(i-1)     i > 0
//! Pending(i) --approve--> Approved
//! Pending(i) --reject---> Rejected
//! Pending(i) --cancel---> Cancelled
//! ```
//!
//! Anything else is refused and leaves the workflow untouched. This module
//! only mutates the in-memory value; persistence, index sync and
//! notifications are sequenced by the engine.

use crate::error::TransitionError;
use crate::instance::{Workflow, WorkflowStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A requested stage move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Forward,
    Revert,
    Approve,
    Reject,
    Cancel,
}

impl Action {
    /// Returns the wire name of this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Revert => "revert",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "revert" => Ok(Self::Revert),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("unknown action: {other}")),
        }
    }
}

/// What a successful transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The workflow moved between stages and is still pending.
    Moved { from: usize, to: usize },
    /// The workflow reached a terminal status while at `stage_index`.
    Finished {
        status: WorkflowStatus,
        stage_index: usize,
    },
}

impl Workflow {
    /// Applies an action to the workflow.
    ///
    /// Moving into a stage discards the votes previously cast on it.
    ///
    /// # Errors
    ///
    /// Returns a `TransitionError` and leaves the workflow unchanged if the
    /// action is not allowed from the current state.
    pub fn apply(&mut self, action: Action) -> Result<Outcome, TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::Terminal {
                status: self.status,
            });
        }

        let from = self.current_stage_index;
        let outcome = match action {
            Action::Forward => {
                if from + 1 >= self.stage_count() {
                    return Err(TransitionError::PastLastStage { stage_index: from });
                }
                self.current_stage_index = from + 1;
                Outcome::Moved { from, to: from + 1 }
            }
            Action::Revert => {
                if from == 0 {
                    return Err(TransitionError::BeforeFirstStage);
                }
                self.current_stage_index = from - 1;
                Outcome::Moved { from, to: from - 1 }
            }
            Action::Approve => self.finish(WorkflowStatus::Approved),
            Action::Reject => self.finish(WorkflowStatus::Rejected),
            Action::Cancel => self.finish(WorkflowStatus::Cancelled),
        };

        // Entering a stage starts a fresh vote on it.
        if let Outcome::Moved { to, .. } = outcome {
            self.votes.retain(|v| v.stage_index != to);
        }
        self.updated_at = Utc::now();
        Ok(outcome)
    }

    fn finish(&mut self, status: WorkflowStatus) -> Outcome {
        self.status = status;
        Outcome::Finished {
            status,
            stage_index: self.current_stage_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{Assignee, StageAssignment};
    use crate::votes::Decision;
    use docflow_core::{TemplateId, UserId};

    fn workflow(stages: usize) -> Workflow {
        let assigned = (0..stages)
            .map(|stage_index| StageAssignment {
                stage_index,
                stage_title: format!("Stage {stage_index}"),
                assignee: Assignee::User {
                    user_id: UserId::new(),
                },
            })
            .collect();
        Workflow::new(TemplateId::new(), UserId::new(), "Test", assigned)
    }

    #[test]
    fn forward_moves_to_next_stage() {
        let mut wf = workflow(3);
        assert_eq!(
            wf.apply(Action::Forward),
            Ok(Outcome::Moved { from: 0, to: 1 })
        );
        assert_eq!(wf.current_stage_index, 1);
        assert_eq!(wf.status, WorkflowStatus::Pending);
    }

    #[test]
    fn forward_past_last_stage_is_refused() {
        let mut wf = workflow(2);
        wf.apply(Action::Forward).expect("first forward");
        let before = wf.clone();
        assert_eq!(
            wf.apply(Action::Forward),
            Err(TransitionError::PastLastStage { stage_index: 1 })
        );
        assert_eq!(wf, before);
    }

    #[test]
    fn revert_from_first_stage_is_refused() {
        let mut wf = workflow(2);
        assert_eq!(
            wf.apply(Action::Revert),
            Err(TransitionError::BeforeFirstStage)
        );
        assert_eq!(wf.current_stage_index, 0);
    }

    #[test]
    fn revert_moves_back() {
        let mut wf = workflow(3);
        wf.apply(Action::Forward).expect("forward");
        wf.apply(Action::Forward).expect("forward");
        assert_eq!(
            wf.apply(Action::Revert),
            Ok(Outcome::Moved { from: 2, to: 1 })
        );
    }

    #[test]
    fn approve_and_reject_are_terminal() {
        let mut wf = workflow(3);
        wf.apply(Action::Forward).expect("forward");
        assert_eq!(
            wf.apply(Action::Approve),
            Ok(Outcome::Finished {
                status: WorkflowStatus::Approved,
                stage_index: 1
            })
        );
        for action in [
            Action::Forward,
            Action::Revert,
            Action::Approve,
            Action::Reject,
            Action::Cancel,
        ] {
            assert_eq!(
                wf.apply(action),
                Err(TransitionError::Terminal {
                    status: WorkflowStatus::Approved
                })
            );
        }

        let mut wf = workflow(1);
        wf.apply(Action::Reject).expect("reject");
        assert_eq!(wf.status, WorkflowStatus::Rejected);
        assert!(wf.apply(Action::Approve).is_err());
    }

    #[test]
    fn cancel_is_terminal() {
        let mut wf = workflow(2);
        wf.apply(Action::Cancel).expect("cancel");
        assert_eq!(wf.status, WorkflowStatus::Cancelled);
        assert!(wf.apply(Action::Forward).is_err());
    }

    #[test]
    fn reentering_a_stage_discards_its_old_votes() {
        let mut wf = workflow(3);
        wf.apply(Action::Forward).expect("forward");
        wf.record_vote(UserId::new(), Decision::Revert, None);
        wf.apply(Action::Revert).expect("revert");
        wf.record_vote(UserId::new(), Decision::Forward, None);
        assert_eq!(wf.votes.len(), 2);

        wf.apply(Action::Forward).expect("forward again");
        assert_eq!(wf.current_tally().total(), 0);
        assert_eq!(wf.votes.len(), 1);
        assert_eq!(wf.votes[0].stage_index, 0);
    }

    #[test]
    fn action_names_roundtrip() {
        for action in [
            Action::Forward,
            Action::Revert,
            Action::Approve,
            Action::Reject,
            Action::Cancel,
        ] {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert!("skip".parse::<Action>().is_err());
    }
}
