//! Integrity checker.
//!
//! Validates a store and its aggregated checks against conservation,
//! completeness and the no-empty-check rule. Every issue blocks a commit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    AssignmentStore, CheckId, CheckSummary, EvenSplitResult, ItemId, MoneyCents, Placement,
    aggregate::grand_total,
};

/// Largest accepted gap between the sum of check totals and the order total.
pub const CONSERVATION_TOLERANCE_CENTS: u64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Check totals do not add up to the order total.
    Conservation,
    /// An item is not paid for by any check.
    Unassigned,
    /// An item's claims do not add up to its total.
    ClaimMismatch,
    /// A placement points at a check that no longer exists.
    UnknownCheck,
    EmptyCheck,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Conservation => "conservation",
            Self::Unassigned => "unassigned",
            Self::ClaimMismatch => "claim_mismatch",
            Self::UnknownCheck => "unknown_check",
            Self::EmptyCheck => "empty_check",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityIssue {
    pub kind: IssueKind,
    pub message: String,
    pub item_id: Option<ItemId>,
    pub check_id: Option<CheckId>,
}

impl IntegrityIssue {
    fn new(kind: IssueKind, message: String) -> Self {
        Self {
            kind,
            message,
            item_id: None,
            check_id: None,
        }
    }

    fn item(mut self, item_id: &ItemId) -> Self {
        self.item_id = Some(item_id.clone());
        self
    }

    fn check(mut self, check_id: CheckId) -> Self {
        self.check_id = Some(check_id);
        self
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

fn conservation(actual: MoneyCents, expected: MoneyCents, what: &str) -> Option<IntegrityIssue> {
    (actual.abs_diff(expected) > CONSERVATION_TOLERANCE_CENTS).then(|| {
        IntegrityIssue::new(
            IssueKind::Conservation,
            format!("{what} add up to {actual}, order total is {expected}"),
        )
    })
}

/// Item-level validation used by every mode except even.
pub fn check_integrity(
    store: &AssignmentStore,
    checks: &[CheckSummary],
    original_total: MoneyCents,
) -> Vec<IntegrityIssue> {
    let mut issues = Vec::new();

    for item in store.items() {
        match store.placement(&item.id) {
            None | Some(Placement::Unassigned) => issues.push(
                IntegrityIssue::new(
                    IssueKind::Unassigned,
                    format!("\"{}\" is not assigned to any check", item.name),
                )
                .item(&item.id),
            ),
            Some(Placement::Whole(check_id)) => {
                if !store.has_check(*check_id) {
                    issues.push(
                        IntegrityIssue::new(
                            IssueKind::UnknownCheck,
                            format!("\"{}\" is assigned to missing check {check_id}", item.name),
                        )
                        .item(&item.id)
                        .check(*check_id),
                    );
                }
            }
            Some(Placement::Fragmented(claims)) => {
                let claimed: MoneyCents = claims.iter().map(|claim| claim.amount).sum();
                if claims.is_empty() || claimed != item.total() {
                    issues.push(
                        IntegrityIssue::new(
                            IssueKind::ClaimMismatch,
                            format!(
                                "claims on \"{}\" add up to {claimed}, item total is {}",
                                item.name,
                                item.total()
                            ),
                        )
                        .item(&item.id),
                    );
                }
                for claim in claims {
                    if claim.amount.is_negative() {
                        issues.push(
                            IntegrityIssue::new(
                                IssueKind::ClaimMismatch,
                                format!("negative claim on \"{}\"", item.name),
                            )
                            .item(&item.id)
                            .check(claim.check_id),
                        );
                    }
                    if !store.has_check(claim.check_id) {
                        issues.push(
                            IntegrityIssue::new(
                                IssueKind::UnknownCheck,
                                format!(
                                    "claim on \"{}\" points at missing check {}",
                                    item.name, claim.check_id
                                ),
                            )
                            .item(&item.id)
                            .check(claim.check_id),
                        );
                    }
                }
            }
        }
    }

    for check in checks.iter().filter(|check| check.is_empty()) {
        issues.push(
            IntegrityIssue::new(
                IssueKind::EmptyCheck,
                format!("check {} has nothing on it", check.check_id),
            )
            .check(check.check_id),
        );
    }

    // the shortfall of an unassigned item is already reported with it
    if !issues.iter().any(|issue| issue.kind == IssueKind::Unassigned) {
        issues.extend(conservation(grand_total(checks), original_total, "check totals"));
    }
    issues
}

/// Even mode only conserves the numeric shares.
pub fn check_even_integrity(
    split: &EvenSplitResult,
    original_total: MoneyCents,
) -> Vec<IntegrityIssue> {
    conservation(split.total(), original_total, "even shares")
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OrderItem, TaxPolicy, aggregate::recompute_totals, compute_even_split};

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem::new("a", "Pasta", MoneyCents::new(1400)).seat(1),
            OrderItem::new("b", "Fish", MoneyCents::new(2200)).seat(2),
            OrderItem::new("c", "Water", MoneyCents::new(300)),
        ]
    }

    fn issues_for(store: &AssignmentStore, total: i64) -> Vec<IntegrityIssue> {
        let checks = recompute_totals(store, &TaxPolicy::inclusive());
        check_integrity(store, &checks, MoneyCents::new(total))
    }

    #[test]
    fn complete_assignment_is_clean() {
        let store = AssignmentStore::single_check(&items());
        assert!(issues_for(&store, 3900).is_empty());
    }

    #[test]
    fn unassigned_item_is_reported_once() {
        let store = AssignmentStore::by_seat(&items());
        let issues = issues_for(&store, 3900);
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::Unassigned]);
        assert_eq!(issues[0].item_id, Some(ItemId::from("c")));
    }

    #[test]
    fn one_cent_of_drift_is_tolerated() {
        let store = AssignmentStore::single_check(&items());
        assert!(issues_for(&store, 3901).is_empty());
        assert!(issues_for(&store, 3899).is_empty());
        assert_eq!(issues_for(&store, 3902).len(), 1);
    }

    #[test]
    fn empty_summaries_are_flagged() {
        let store = AssignmentStore::single_check(&items());
        let mut checks = recompute_totals(&store, &TaxPolicy::inclusive());
        checks.push(CheckSummary {
            check_id: CheckId::new(7),
            seat: None,
            lines: vec![],
            subtotal: MoneyCents::ZERO,
            tax: MoneyCents::ZERO,
            total: MoneyCents::ZERO,
        });
        let issues = check_integrity(&store, &checks, MoneyCents::new(3900));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EmptyCheck);
        assert_eq!(issues[0].check_id, Some(CheckId::new(7)));
    }

    #[test]
    fn even_split_is_always_conserved() {
        let split = compute_even_split(MoneyCents::new(4700), 3).unwrap();
        assert!(check_even_integrity(&split, MoneyCents::new(4700)).is_empty());
        assert_eq!(check_even_integrity(&split, MoneyCents::new(5000)).len(), 1);
    }
}
