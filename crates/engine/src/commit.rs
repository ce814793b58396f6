//! Commit plans.
//!
//! Turns a validated session into the transport-independent description of
//! what the persistence boundary must apply. Building a plan borrows the
//! session immutably, so a failed commit can be retried from the exact same
//! state.

use uuid::Uuid;

use crate::{CheckId, Claim, EngineError, ItemId, Placement, ResultEngine, SplitMode, SplitSession};

/// Claims of one fragmented item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitItemPlan {
    pub item_id: ItemId,
    pub claims: Vec<Claim>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitPlan {
    /// Item-level split: whole assignments plus fragmented items.
    Tickets {
        assignments: Vec<(ItemId, CheckId)>,
        split_items: Vec<SplitItemPlan>,
        check_count: usize,
    },
    Even { num_ways: u32 },
}

impl CommitPlan {
    /// Number of split orders the boundary is expected to create.
    pub fn expected_split_orders(&self) -> usize {
        match self {
            Self::Tickets { check_count, .. } => *check_count,
            Self::Even { num_ways } => *num_ways as usize,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedCommit {
    pub order_id: String,
    /// Order version the split was computed against.
    pub version: Option<String>,
    pub idempotency_key: Uuid,
    pub plan: CommitPlan,
}

impl SplitSession {
    /// Build the commit plan for the current state, refusing while integrity
    /// issues exist.
    pub fn prepare_commit(&self) -> ResultEngine<PreparedCommit> {
        if self.has_integrity_issue() {
            return Err(EngineError::IntegrityBlocked(self.issues().to_vec()));
        }

        let plan = match self.mode() {
            SplitMode::Even => CommitPlan::Even {
                num_ways: self.num_ways(),
            },
            SplitMode::BySeat | SplitMode::Custom | SplitMode::ByPrice => {
                let store = self.store();
                let mut assignments = Vec::new();
                let mut split_items = Vec::new();
                for item in store.items() {
                    match store.placement(&item.id) {
                        Some(Placement::Whole(check_id)) => {
                            assignments.push((item.id.clone(), *check_id));
                        }
                        Some(Placement::Fragmented(claims)) => split_items.push(SplitItemPlan {
                            item_id: item.id.clone(),
                            claims: claims.clone(),
                        }),
                        None | Some(Placement::Unassigned) => {
                            return Err(EngineError::IntegrityBlocked(self.issues().to_vec()));
                        }
                    }
                }
                CommitPlan::Tickets {
                    assignments,
                    split_items,
                    check_count: store.check_count(),
                }
            }
        };

        Ok(PreparedCommit {
            order_id: self.order_id().to_string(),
            version: self.order().version.clone(),
            idempotency_key: self.commit_key(),
            plan,
        })
    }
}
