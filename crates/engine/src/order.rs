//! Order snapshot handed to the engine when a split session opens.
//!
//! The snapshot is immutable input: the engine never edits items, it only
//! decides which check pays for them.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine, TaxPolicy};

/// Upper bound for lines plus tax; the slack absorbs per-check rounding.
const AMOUNT_CEILING: i64 = i64::MAX / 2;

/// Identifier of an order line, as assigned by the order service.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One line on the original order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: ItemId,
    pub name: String,
    #[serde(rename = "unit_price_minor")]
    pub unit_price: MoneyCents,
    pub quantity: u32,
    #[serde(default)]
    pub seat: Option<u32>,
    /// Informational only; does not restrict movement between checks.
    #[serde(default)]
    pub sent_to_kitchen: bool,
    #[serde(default)]
    pub is_paid: bool,
    /// Menu category, carried through to the check lines for display.
    #[serde(default)]
    pub category: Option<String>,
}

impl OrderItem {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, unit_price: MoneyCents) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            seat: None,
            sent_to_kitchen: false,
            is_paid: false,
            category: None,
        }
    }

    #[must_use]
    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    #[must_use]
    pub fn seat(mut self, seat: u32) -> Self {
        self.seat = Some(seat);
        self
    }

    #[must_use]
    pub fn paid(mut self) -> Self {
        self.is_paid = true;
        self
    }

    #[must_use]
    pub fn sent_to_kitchen(mut self) -> Self {
        self.sent_to_kitchen = true;
        self
    }

    /// `unit_price * quantity`, `None` on overflow.
    pub fn checked_total(&self) -> Option<MoneyCents> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }

    /// Line total. Snapshots are validated on session open, so overflow is
    /// already ruled out for items living in a session.
    pub fn total(&self) -> MoneyCents {
        MoneyCents::new(
            self.unit_price
                .cents()
                .saturating_mul(i64::from(self.quantity)),
        )
    }
}

/// The order as seen by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: String,
    #[serde(rename = "original_total_minor")]
    pub original_total: MoneyCents,
    /// Optimistic-concurrency token echoed back on commit.
    #[serde(default)]
    pub version: Option<String>,
    pub items: Vec<OrderItem>,
}

impl OrderSnapshot {
    pub fn new(
        order_id: impl Into<String>,
        original_total: MoneyCents,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            original_total,
            version: None,
            items,
        }
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Structural checks plus amount headroom: whatever checks the lines end
    /// up on, no subtotal, tax or total may leave the `i64` range.
    pub(crate) fn validate(&self, tax: &TaxPolicy) -> ResultEngine<()> {
        if self.order_id.trim().is_empty() {
            return Err(EngineError::InvalidOrder(
                "order id must not be empty".to_string(),
            ));
        }
        if self.items.is_empty() {
            return Err(EngineError::InvalidOrder(format!(
                "order {} has no items to split",
                self.order_id
            )));
        }

        let mut seen = HashSet::with_capacity(self.items.len());
        let mut magnitude = MoneyCents::ZERO;
        for item in &self.items {
            if !seen.insert(&item.id) {
                return Err(EngineError::InvalidOrder(format!(
                    "duplicate item id \"{}\"",
                    item.id
                )));
            }
            if item.quantity == 0 {
                return Err(EngineError::InvalidOrder(format!(
                    "item \"{}\" has zero quantity",
                    item.id
                )));
            }
            let total = item.checked_total().ok_or_else(|| {
                EngineError::InvalidAmount(format!("total of item \"{}\" overflows", item.id))
            })?;
            magnitude = total
                .cents()
                .checked_abs()
                .and_then(|abs| magnitude.checked_add(MoneyCents::new(abs)))
                .ok_or_else(|| EngineError::InvalidAmount("order subtotal overflows".to_string()))?;
        }

        let ceiling = magnitude
            .checked_add(tax.tax_on(magnitude))
            .filter(|ceiling| ceiling.cents() <= AMOUNT_CEILING);
        if ceiling.is_none() {
            return Err(EngineError::InvalidAmount(format!(
                "order {} is too large to split with the configured tax",
                self.order_id
            )));
        }
        Ok(())
    }
}
