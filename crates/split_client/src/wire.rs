//! Mapping between engine commit plans and the order service wire types.

use api_types::split::{
    ClaimView, EvenSplitRequest, ItemAssignment, SplitItemClaims, SplitTicketsRequest,
};
use engine::{CommitPlan, SplitItemPlan};

/// A request ready to be posted: endpoint path plus JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitRequest {
    Tickets(SplitTicketsRequest),
    Even(EvenSplitRequest),
}

impl CommitRequest {
    /// Path segments below the base URL. Each one is percent-encoded on its
    /// own when joined, so an order id never spans segments.
    pub fn segments<'a>(&self, order_id: &'a str) -> [&'a str; 3] {
        let endpoint = match self {
            Self::Tickets(_) => "split-tickets",
            Self::Even(_) => "split",
        };
        ["orders", order_id, endpoint]
    }
}

impl From<&CommitPlan> for CommitRequest {
    fn from(plan: &CommitPlan) -> Self {
        match plan {
            CommitPlan::Tickets {
                assignments,
                split_items,
                ..
            } => Self::Tickets(SplitTicketsRequest {
                assignments: assignments
                    .iter()
                    .map(|(item_id, check_id)| ItemAssignment {
                        item_id: item_id.to_string(),
                        check_id: check_id.get(),
                    })
                    .collect(),
                split_items: (!split_items.is_empty())
                    .then(|| split_items.iter().map(split_item_claims).collect()),
            }),
            CommitPlan::Even { num_ways } => Self::Even(EvenSplitRequest::new(*num_ways)),
        }
    }
}

fn split_item_claims(item: &SplitItemPlan) -> SplitItemClaims {
    SplitItemClaims {
        item_id: item.item_id.to_string(),
        claims: item
            .claims
            .iter()
            .map(|claim| ClaimView {
                check_id: claim.check_id.get(),
                amount_minor: claim.amount.cents(),
            })
            .collect(),
    }
}
