//! Split session: the mode controller wrapped around one assignment store.
//!
//! A session owns the order snapshot, the active [`SplitMode`], the canonical
//! [`AssignmentStore`] and the derived checks and integrity issues, which are
//! recomputed after every successful mutation. Rejected operations leave the
//! session untouched.

use std::fmt;

use uuid::Uuid;

use crate::{
    AssignmentStore, CheckId, CheckSummary, EngineError, EvenSplitResult, IntegrityIssue, ItemId,
    KeepAssignments, MoneyCents, OrderSnapshot, ResultEngine, SeatSeeding, SeedStrategy,
    SplitMode, TaxPolicy, MAX_WAYS, aggregate, compute_even_split, integrity,
};

pub struct SplitSession {
    order: OrderSnapshot,
    tax: TaxPolicy,
    mode: SplitMode,
    store: AssignmentStore,
    num_ways: u32,
    by_price: Box<dyn SeedStrategy>,
    /// Mode to restore untouched when leaving even mode.
    resume_mode: Option<SplitMode>,
    checks: Vec<CheckSummary>,
    issues: Vec<IntegrityIssue>,
    commit_key: Uuid,
}

impl fmt::Debug for SplitSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitSession")
            .field("order_id", &self.order.order_id)
            .field("mode", &self.mode)
            .field("num_ways", &self.num_ways)
            .field("checks", &self.checks.len())
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}

impl SplitSession {
    /// Return a builder for `SplitSession`. Help to build the struct.
    pub fn builder() -> SplitSessionBuilder {
        SplitSessionBuilder::default()
    }

    pub fn order(&self) -> &OrderSnapshot {
        &self.order
    }

    pub fn order_id(&self) -> &str {
        &self.order.order_id
    }

    pub fn original_total(&self) -> MoneyCents {
        self.order.original_total
    }

    pub fn tax(&self) -> &TaxPolicy {
        &self.tax
    }

    pub fn mode(&self) -> SplitMode {
        self.mode
    }

    pub fn store(&self) -> &AssignmentStore {
        &self.store
    }

    pub fn num_ways(&self) -> u32 {
        self.num_ways
    }

    /// Item-based checks, in check id order. Kept up to date in every mode,
    /// even though even mode does not commit them.
    pub fn checks(&self) -> &[CheckSummary] {
        &self.checks
    }

    pub fn issues(&self) -> &[IntegrityIssue] {
        &self.issues
    }

    pub fn has_integrity_issue(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Key identifying the current state for commit retries. Changes on every
    /// successful mutation.
    pub fn commit_key(&self) -> Uuid {
        self.commit_key
    }

    /// Even split of the order total over the configured number of ways.
    pub fn even_split(&self) -> ResultEngine<EvenSplitResult> {
        compute_even_split(self.order.original_total, self.num_ways)
    }

    fn refresh(&mut self) {
        self.checks = aggregate::recompute_totals(&self.store, &self.tax);
        self.issues = if self.mode.uses_items() {
            integrity::check_integrity(&self.store, &self.checks, self.order.original_total)
        } else {
            match self.even_split() {
                Ok(split) => integrity::check_even_integrity(&split, self.order.original_total),
                Err(err) => vec![IntegrityIssue {
                    kind: integrity::IssueKind::Conservation,
                    message: err.to_string(),
                    item_id: None,
                    check_id: None,
                }],
            }
        };
        self.commit_key = Uuid::new_v4();
        if !self.issues.is_empty() {
            tracing::debug!(
                "order {} has {} integrity issue(s) in {} mode",
                self.order.order_id,
                self.issues.len(),
                self.mode
            );
        }
    }

    fn strategy_for(&self, mode: SplitMode) -> &dyn SeedStrategy {
        match mode {
            SplitMode::BySeat => &SeatSeeding,
            SplitMode::ByPrice => self.by_price.as_ref(),
            SplitMode::Custom | SplitMode::Even => &KeepAssignments,
        }
    }

    fn ensure_item_mode(&self) -> ResultEngine<()> {
        if self.mode.uses_items() {
            Ok(())
        } else {
            Err(EngineError::ModeUnavailable(self.mode))
        }
    }

    /// Run a store mutation and refresh derived state only if it succeeded.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut AssignmentStore) -> ResultEngine<T>,
    ) -> ResultEngine<T> {
        self.ensure_item_mode()?;
        match op(&mut self.store) {
            Ok(value) => {
                self.refresh();
                Ok(value)
            }
            Err(err) => {
                tracing::debug!("order {}: rejected: {err}", self.order.order_id);
                Err(err)
            }
        }
    }

    /// Switch the active mode.
    pub fn apply_mode(&mut self, mode: SplitMode) {
        if mode == self.mode {
            return;
        }
        let previous = self.mode;

        if mode == SplitMode::Even {
            self.resume_mode = Some(previous);
            self.store.clear_selection();
        } else if previous == SplitMode::Even && self.resume_mode == Some(mode) {
            // assignments were kept aside while even mode was active
            self.store.clear_selection();
        } else {
            let strategy = self.strategy_for(mode);
            let mut store = self.store.clone();
            strategy.seed(&mut store);
            self.store = store;
        }

        if mode != SplitMode::Even {
            self.resume_mode = None;
        }
        self.mode = mode;
        self.refresh();
        tracing::info!(
            "order {}: split mode {previous} -> {mode}",
            self.order.order_id
        );
    }

    /// Number of payers for even mode.
    pub fn set_num_ways(&mut self, num_ways: u32) -> ResultEngine<()> {
        if !(2..=MAX_WAYS).contains(&num_ways) {
            return Err(EngineError::InvalidWays(num_ways));
        }
        self.num_ways = num_ways;
        self.refresh();
        Ok(())
    }

    pub fn select_item(&mut self, item_id: Option<&ItemId>) -> ResultEngine<()> {
        self.ensure_item_mode()?;
        self.store.select_item(item_id)
    }

    pub fn move_item_to_check(&mut self, check_id: CheckId) -> ResultEngine<()> {
        self.mutate(|store| store.move_item_to_check(check_id))
    }

    pub fn move_item_to_new_check(&mut self) -> ResultEngine<CheckId> {
        self.mutate(AssignmentStore::move_item_to_new_check)
    }

    pub fn delete_check(&mut self, check_id: CheckId) -> ResultEngine<()> {
        self.mutate(|store| store.delete_check(check_id))
    }

    pub fn split_item(&mut self, item_id: &ItemId, ways: u32) -> ResultEngine<()> {
        self.mutate(|store| store.split_item(item_id, ways))
    }

    pub fn merge_item(&mut self, item_id: &ItemId) -> ResultEngine<CheckId> {
        self.mutate(|store| store.merge_item(item_id))
    }
}

/// The builder for `SplitSession`
#[derive(Debug, Default)]
pub struct SplitSessionBuilder {
    order: Option<OrderSnapshot>,
    tax: TaxPolicy,
    mode: SplitMode,
    num_ways: Option<u32>,
    by_price: Option<Box<dyn SeedStrategy>>,
}

impl SplitSessionBuilder {
    /// Pass the order snapshot to split
    pub fn order(mut self, order: OrderSnapshot) -> SplitSessionBuilder {
        self.order = Some(order);
        self
    }

    pub fn tax(mut self, tax: TaxPolicy) -> SplitSessionBuilder {
        self.tax = tax;
        self
    }

    /// Mode the session starts in (default [`SplitMode::BySeat`])
    pub fn mode(mut self, mode: SplitMode) -> SplitSessionBuilder {
        self.mode = mode;
        self
    }

    /// Initial number of ways for even mode (default 2)
    pub fn num_ways(mut self, num_ways: u32) -> SplitSessionBuilder {
        self.num_ways = Some(num_ways);
        self
    }

    /// Strategy used when entering [`SplitMode::ByPrice`]
    pub fn by_price_strategy(mut self, strategy: impl SeedStrategy + 'static) -> SplitSessionBuilder {
        self.by_price = Some(Box::new(strategy));
        self
    }

    /// Construct `SplitSession`
    pub fn build(self) -> ResultEngine<SplitSession> {
        let order = self
            .order
            .ok_or_else(|| EngineError::InvalidOrder("missing order snapshot".to_string()))?;
        order.validate(&self.tax)?;

        let num_ways = self.num_ways.unwrap_or(2);
        if !(2..=MAX_WAYS).contains(&num_ways) {
            return Err(EngineError::InvalidWays(num_ways));
        }

        let store = AssignmentStore::single_check(&order.items);
        let mut session = SplitSession {
            order,
            tax: self.tax,
            mode: SplitMode::Custom,
            store,
            num_ways,
            by_price: self.by_price.unwrap_or_else(|| Box::new(KeepAssignments)),
            resume_mode: None,
            checks: Vec::new(),
            issues: Vec::new(),
            commit_key: Uuid::new_v4(),
        };
        session.refresh();
        session.apply_mode(self.mode);
        tracing::debug!(
            "opened split session for order {} in {} mode",
            session.order.order_id,
            session.mode
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OrderItem;

    fn order() -> OrderSnapshot {
        OrderSnapshot::new(
            "order-42",
            MoneyCents::new(4700),
            vec![
                OrderItem::new("a", "Risotto", MoneyCents::new(1800)).seat(1),
                OrderItem::new("b", "Steak", MoneyCents::new(2900)).seat(2),
            ],
        )
    }

    #[test]
    fn builder_requires_an_order() {
        assert!(matches!(
            SplitSession::builder().build(),
            Err(EngineError::InvalidOrder(_))
        ));
    }

    #[test]
    fn builder_rejects_one_way() {
        assert_eq!(
            SplitSession::builder().order(order()).num_ways(1).build().err(),
            Some(EngineError::InvalidWays(1))
        );
    }

    #[test]
    fn starts_by_seat_by_default() {
        let session = SplitSession::builder().order(order()).build().unwrap();
        assert_eq!(session.mode(), SplitMode::BySeat);
        assert_eq!(session.checks().len(), 2);
        assert!(!session.has_integrity_issue());
    }

    #[test]
    fn custom_start_is_one_check() {
        let session = SplitSession::builder()
            .order(order())
            .mode(SplitMode::Custom)
            .build()
            .unwrap();
        assert_eq!(session.checks().len(), 1);
        assert_eq!(session.checks()[0].total, MoneyCents::new(4700));
    }

    #[test]
    fn commit_key_changes_only_on_success() {
        let mut session = SplitSession::builder().order(order()).build().unwrap();
        let key = session.commit_key();
        assert!(session.move_item_to_check(CheckId::new(1)).is_err());
        assert_eq!(session.commit_key(), key);

        session.select_item(Some(&ItemId::from("b"))).unwrap();
        session.move_item_to_check(CheckId::new(1)).unwrap();
        assert_ne!(session.commit_key(), key);
    }

    #[test]
    fn even_mode_rejects_item_mutations() {
        let mut session = SplitSession::builder()
            .order(order())
            .mode(SplitMode::Even)
            .build()
            .unwrap();
        assert_eq!(
            session.split_item(&ItemId::from("a"), 2),
            Err(EngineError::ModeUnavailable(SplitMode::Even))
        );
        assert_eq!(
            session.select_item(Some(&ItemId::from("a"))),
            Err(EngineError::ModeUnavailable(SplitMode::Even))
        );
        session.set_num_ways(3).unwrap();
        assert_eq!(session.even_split().unwrap().shares.len(), 3);
        assert_eq!(session.set_num_ways(1), Err(EngineError::InvalidWays(1)));
        assert_eq!(session.num_ways(), 3);
    }

    #[test]
    fn oversized_splits_are_rejected_without_side_effects() {
        let mut session = SplitSession::builder()
            .order(order())
            .mode(SplitMode::Even)
            .build()
            .unwrap();
        let key = session.commit_key();
        assert_eq!(
            session.set_num_ways(u32::MAX),
            Err(EngineError::InvalidWays(u32::MAX))
        );
        assert_eq!(session.num_ways(), 2);
        assert_eq!(session.commit_key(), key);

        session.apply_mode(SplitMode::Custom);
        let store = session.store().clone();
        assert_eq!(
            session.split_item(&ItemId::from("a"), u32::MAX),
            Err(EngineError::InvalidWays(u32::MAX))
        );
        assert_eq!(session.store(), &store);

        assert_eq!(
            SplitSession::builder().order(order()).num_ways(101).build().err(),
            Some(EngineError::InvalidWays(101))
        );
    }

    #[test]
    fn builder_rejects_amounts_without_room_for_tax() {
        let order = OrderSnapshot::new(
            "order-43",
            MoneyCents::new(0),
            vec![OrderItem::new("a", "Yacht", MoneyCents::new(i64::MAX - 10))],
        );
        let result = SplitSession::builder()
            .order(order)
            .tax(TaxPolicy::new(vec![crate::TaxRate::new("vat", 1000)]))
            .build();
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
    }
}
