//! Check aggregator: derived subtotal, tax and total for every check.

use serde::{Deserialize, Serialize};

use crate::{AssignmentStore, CheckEntry, CheckId, ItemId, MoneyCents, TaxPolicy};

/// How a line ended up on a check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineShare {
    Whole { quantity: u32 },
    Claim { part: usize, of: usize },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckLine {
    pub item_id: ItemId,
    pub name: String,
    pub category: Option<String>,
    pub share: LineShare,
    pub amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSummary {
    pub check_id: CheckId,
    pub seat: Option<u32>,
    pub lines: Vec<CheckLine>,
    pub subtotal: MoneyCents,
    pub tax: MoneyCents,
    pub total: MoneyCents,
}

impl CheckSummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Recompute every check from the store's current contents, in check id
/// order.
pub fn recompute_totals(store: &AssignmentStore, tax: &TaxPolicy) -> Vec<CheckSummary> {
    store
        .checks()
        .map(|check| {
            let lines: Vec<CheckLine> = store
                .entries(check.id)
                .into_iter()
                .map(|entry| match entry {
                    CheckEntry::Whole(item) => CheckLine {
                        item_id: item.id.clone(),
                        name: item.name.clone(),
                        category: item.category.clone(),
                        share: LineShare::Whole {
                            quantity: item.quantity,
                        },
                        amount: item.total(),
                    },
                    CheckEntry::Claim {
                        item,
                        claim,
                        part,
                        of,
                    } => CheckLine {
                        item_id: item.id.clone(),
                        name: item.name.clone(),
                        category: item.category.clone(),
                        share: LineShare::Claim { part, of },
                        amount: claim.amount,
                    },
                })
                .collect();
            let subtotal: MoneyCents = lines.iter().map(|line| line.amount).sum();
            let tax = tax.tax_on(subtotal);
            CheckSummary {
                check_id: check.id,
                seat: check.seat,
                lines,
                subtotal,
                tax,
                total: subtotal + tax,
            }
        })
        .collect()
}

/// Sum of check totals.
pub fn grand_total(checks: &[CheckSummary]) -> MoneyCents {
    checks.iter().map(|check| check.total).sum()
}
