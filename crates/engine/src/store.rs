//! Assignment store.
//!
//! The canonical, session-scoped mapping of order items to checks. Every
//! placed item is either assigned whole to one check or fragmented into
//! [`Claim`]s whose amounts add up to the item total. Items without a seat are
//! left [`Placement::Unassigned`] by seat seeding until the user places them.
//!
//! Mutations keep two structural guarantees:
//! - at least one check always exists;
//! - a check that loses its last whole item or claim is removed in the same
//!   operation, so empty checks never exist at rest.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ItemId, MoneyCents, OrderItem, ResultEngine, apportion};

/// Identifier of a check inside one session. Allocated from 1 upwards and
/// never reused, so the lowest id is always the oldest check.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CheckId(u32);

impl CheckId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fractional ownership of one item's cost, held by one check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub item_id: ItemId,
    pub check_id: CheckId,
    pub amount: MoneyCents,
}

/// Where an item currently lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Unassigned,
    Whole(CheckId),
    Fragmented(Vec<Claim>),
}

/// A split bucket. Its contents are derived from the item placements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub id: CheckId,
    /// Seat the check was seeded from, if any.
    pub seat: Option<u32>,
}

/// A borrowed view of one entry held by a check, in order item order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckEntry<'a> {
    Whole(&'a OrderItem),
    Claim {
        item: &'a OrderItem,
        claim: &'a Claim,
        /// 1-based position of the claim among the item's claims.
        part: usize,
        of: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentStore {
    items: Vec<OrderItem>,
    placements: HashMap<ItemId, Placement>,
    checks: BTreeMap<CheckId, Check>,
    next_check_id: u32,
    selected: Option<ItemId>,
}

impl AssignmentStore {
    fn empty(items: &[OrderItem]) -> Self {
        Self {
            items: items.to_vec(),
            placements: items
                .iter()
                .map(|item| (item.id.clone(), Placement::Unassigned))
                .collect(),
            checks: BTreeMap::new(),
            next_check_id: 1,
            selected: None,
        }
    }

    /// Fresh working set: one check holding every item.
    pub fn single_check(items: &[OrderItem]) -> Self {
        let mut store = Self::empty(items);
        let check_id = store.open_check(None);
        for placement in store.placements.values_mut() {
            *placement = Placement::Whole(check_id);
        }
        store
    }

    /// One check per distinct seat, in ascending seat order. Items without a
    /// seat stay unassigned. With no seats at all this degenerates to
    /// [`single_check`](Self::single_check).
    pub fn by_seat(items: &[OrderItem]) -> Self {
        let seats: BTreeSet<u32> = items.iter().filter_map(|item| item.seat).collect();
        if seats.is_empty() {
            return Self::single_check(items);
        }

        let mut store = Self::empty(items);
        let seat_checks: BTreeMap<u32, CheckId> = seats
            .into_iter()
            .map(|seat| (seat, store.open_check(Some(seat))))
            .collect();
        for item in items {
            if let Some(check_id) = item.seat.and_then(|seat| seat_checks.get(&seat)) {
                store
                    .placements
                    .insert(item.id.clone(), Placement::Whole(*check_id));
            }
        }
        store
    }

    fn open_check(&mut self, seat: Option<u32>) -> CheckId {
        let id = CheckId::new(self.next_check_id);
        self.next_check_id += 1;
        self.checks.insert(id, Check { id, seat });
        id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn item(&self, item_id: &ItemId) -> ResultEngine<&OrderItem> {
        self.items
            .iter()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| EngineError::ItemNotFound(item_id.clone()))
    }

    pub fn placement(&self, item_id: &ItemId) -> Option<&Placement> {
        self.placements.get(item_id)
    }

    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.values()
    }

    pub fn check_ids(&self) -> Vec<CheckId> {
        self.checks.keys().copied().collect()
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn has_check(&self, check_id: CheckId) -> bool {
        self.checks.contains_key(&check_id)
    }

    pub fn selected(&self) -> Option<&ItemId> {
        self.selected.as_ref()
    }

    pub fn claims(&self, item_id: &ItemId) -> Option<&[Claim]> {
        match self.placements.get(item_id) {
            Some(Placement::Fragmented(claims)) => Some(claims),
            _ => None,
        }
    }

    /// Items no check pays for yet.
    pub fn unassigned(&self) -> Vec<&OrderItem> {
        self.items
            .iter()
            .filter(|item| matches!(self.placements.get(&item.id), Some(Placement::Unassigned)))
            .collect()
    }

    /// Entries held by `check_id`, in order item order.
    pub fn entries(&self, check_id: CheckId) -> Vec<CheckEntry<'_>> {
        let mut entries = Vec::new();
        for item in &self.items {
            match self.placements.get(&item.id) {
                Some(Placement::Whole(id)) if *id == check_id => {
                    entries.push(CheckEntry::Whole(item));
                }
                Some(Placement::Fragmented(claims)) => {
                    let of = claims.len();
                    entries.extend(
                        claims
                            .iter()
                            .enumerate()
                            .filter(|(_, claim)| claim.check_id == check_id)
                            .map(|(idx, claim)| CheckEntry::Claim {
                                item,
                                claim,
                                part: idx + 1,
                                of,
                            }),
                    );
                }
                _ => {}
            }
        }
        entries
    }

    pub fn is_check_empty(&self, check_id: CheckId) -> bool {
        !self
            .placements
            .values()
            .any(|placement| holds(placement, check_id))
    }

    fn ensure_check(&self, check_id: CheckId) -> ResultEngine<()> {
        if self.has_check(check_id) {
            Ok(())
        } else {
            Err(EngineError::CheckNotFound(check_id))
        }
    }

    fn unpaid_item(&self, item_id: &ItemId) -> ResultEngine<&OrderItem> {
        let item = self.item(item_id)?;
        if item.is_paid {
            return Err(EngineError::ItemPaid(item_id.clone()));
        }
        Ok(item)
    }

    /// The active item, verified to be movable.
    fn movable_selection(&self) -> ResultEngine<ItemId> {
        let item_id = self.selected.clone().ok_or(EngineError::NoItemSelected)?;
        self.unpaid_item(&item_id)?;
        if let Some(Placement::Fragmented(_)) = self.placements.get(&item_id) {
            return Err(EngineError::ItemFragmented(item_id));
        }
        Ok(item_id)
    }

    /// Remove every check left without entries, keeping at least one check.
    fn prune_empty_checks(&mut self) {
        let empty: Vec<CheckId> = self
            .checks
            .keys()
            .copied()
            .filter(|id| self.is_check_empty(*id))
            .collect();
        for id in empty {
            if self.checks.len() == 1 {
                break;
            }
            self.checks.remove(&id);
            tracing::debug!("removed emptied check {id}");
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Mark `item_id` as the active item, or clear the selection with `None`.
    pub fn select_item(&mut self, item_id: Option<&ItemId>) -> ResultEngine<()> {
        let Some(item_id) = item_id else {
            self.clear_selection();
            return Ok(());
        };
        self.item(item_id)?;
        if let Some(Placement::Fragmented(_)) = self.placements.get(item_id) {
            return Err(EngineError::ItemFragmented(item_id.clone()));
        }
        self.selected = Some(item_id.clone());
        Ok(())
    }

    pub fn move_item_to_check(&mut self, check_id: CheckId) -> ResultEngine<()> {
        let item_id = self.movable_selection()?;
        self.ensure_check(check_id)?;

        self.placements
            .insert(item_id.clone(), Placement::Whole(check_id));
        self.selected = None;
        self.prune_empty_checks();
        tracing::debug!("moved item {item_id} to check {check_id}");
        Ok(())
    }

    /// Open a new check holding exactly the active item.
    pub fn move_item_to_new_check(&mut self) -> ResultEngine<CheckId> {
        let item_id = self.movable_selection()?;

        let check_id = self.open_check(None);
        self.placements
            .insert(item_id.clone(), Placement::Whole(check_id));
        self.selected = None;
        self.prune_empty_checks();
        tracing::debug!("moved item {item_id} to new check {check_id}");
        Ok(check_id)
    }

    /// Delete `check_id`, handing its contents to the lowest remaining check.
    pub fn delete_check(&mut self, check_id: CheckId) -> ResultEngine<()> {
        self.ensure_check(check_id)?;
        if self.checks.len() == 1 {
            return Err(EngineError::LastCheck);
        }
        if let Some(item) = self.items.iter().find(|item| {
            item.is_paid
                && self
                    .placements
                    .get(&item.id)
                    .is_some_and(|placement| holds(placement, check_id))
        }) {
            return Err(EngineError::ItemPaid(item.id.clone()));
        }

        let target = self
            .checks
            .keys()
            .copied()
            .find(|id| *id != check_id)
            .ok_or(EngineError::LastCheck)?;

        for placement in self.placements.values_mut() {
            match placement {
                Placement::Whole(id) if *id == check_id => *id = target,
                Placement::Fragmented(claims) => {
                    if let Some(collapsed) = rehome_claims(claims, check_id, target) {
                        *placement = collapsed;
                    }
                }
                _ => {}
            }
        }
        self.checks.remove(&check_id);
        tracing::debug!("deleted check {check_id}, contents moved to check {target}");
        Ok(())
    }

    /// Replace the item's placement with `ways` claims distributed round-robin
    /// over the checks that still hold something, opening new checks as needed.
    pub fn split_item(&mut self, item_id: &ItemId, ways: u32) -> ResultEngine<()> {
        let total = self.unpaid_item(item_id)?.total();
        let amounts = apportion::fragment_item(total, ways)?;

        let previous = self
            .placements
            .insert(item_id.clone(), Placement::Unassigned)
            .unwrap_or(Placement::Unassigned);
        let mut targets: Vec<CheckId> = self
            .checks
            .keys()
            .copied()
            .filter(|id| !self.is_check_empty(*id))
            .collect();

        let mut claims = Vec::with_capacity(amounts.len());
        for (idx, amount) in amounts.into_iter().enumerate() {
            let check_id = match targets.get(idx) {
                Some(id) => *id,
                None => {
                    let id = self.open_check(None);
                    targets.push(id);
                    id
                }
            };
            claims.push(Claim {
                item_id: item_id.clone(),
                check_id,
                amount,
            });
        }

        self.placements
            .insert(item_id.clone(), Placement::Fragmented(claims));
        if self.selected.as_ref() == Some(item_id) {
            self.selected = None;
        }
        self.prune_empty_checks();
        tracing::debug!(
            "split item {item_id} ({total}) {ways} ways, previously {}",
            describe(&previous)
        );
        Ok(())
    }

    /// Collapse the item's claims onto the check holding the largest share
    /// (ties go to the lowest check id).
    pub fn merge_item(&mut self, item_id: &ItemId) -> ResultEngine<CheckId> {
        self.item(item_id)?;
        let Some(Placement::Fragmented(claims)) = self.placements.get(item_id) else {
            return Err(EngineError::ItemNotFragmented(item_id.clone()));
        };

        let mut per_check: BTreeMap<CheckId, MoneyCents> = BTreeMap::new();
        for claim in claims {
            *per_check.entry(claim.check_id).or_default() += claim.amount;
        }
        let mut target: Option<(CheckId, MoneyCents)> = None;
        for (check_id, amount) in per_check {
            if target.is_none_or(|(_, best)| amount > best) {
                target = Some((check_id, amount));
            }
        }
        let (target, _) = target.ok_or_else(|| EngineError::ItemNotFragmented(item_id.clone()))?;

        self.placements
            .insert(item_id.clone(), Placement::Whole(target));
        self.prune_empty_checks();
        tracing::debug!("merged item {item_id} into check {target}");
        Ok(target)
    }
}

fn holds(placement: &Placement, check_id: CheckId) -> bool {
    match placement {
        Placement::Unassigned => false,
        Placement::Whole(id) => *id == check_id,
        Placement::Fragmented(claims) => claims.iter().any(|claim| claim.check_id == check_id),
    }
}

/// Move claims from `from` to `to`, combining claims that end up on the same
/// check. Returns a whole placement when a single claim is left.
fn rehome_claims(claims: &mut Vec<Claim>, from: CheckId, to: CheckId) -> Option<Placement> {
    if !claims.iter().any(|claim| claim.check_id == from) {
        return None;
    }
    let mut merged: Vec<Claim> = Vec::with_capacity(claims.len());
    for mut claim in claims.drain(..) {
        if claim.check_id == from {
            claim.check_id = to;
        }
        match merged.iter_mut().find(|c| c.check_id == claim.check_id) {
            Some(existing) => existing.amount += claim.amount,
            None => merged.push(claim),
        }
    }
    if let [only] = merged.as_slice() {
        return Some(Placement::Whole(only.check_id));
    }
    *claims = merged;
    None
}

fn describe(placement: &Placement) -> String {
    match placement {
        Placement::Unassigned => "unassigned".to_string(),
        Placement::Whole(id) => format!("on check {id}"),
        Placement::Fragmented(claims) => format!("in {} claims", claims.len()),
    }
}
