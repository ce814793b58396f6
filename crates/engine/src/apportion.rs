//! Monetary apportioner.
//!
//! Divides an amount into `ways` parts with the "last part absorbs the
//! remainder" rule: parts `1..ways-1` get `floor(total / ways)` and the last
//! part gets whatever is left, so the parts always add up to the total
//! exactly. Guests compare receipts, so this rule must stay bit-for-bit
//! stable; it is intentionally not a largest-remainder distribution.

use serde::{Deserialize, Serialize};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Most parts a total or a line may be divided into.
pub const MAX_WAYS: u32 = 100;

/// Outcome of dividing the order total evenly among `num_ways` payers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvenSplitResult {
    pub num_ways: u32,
    pub shares: Vec<MoneyCents>,
}

impl EvenSplitResult {
    pub fn total(&self) -> MoneyCents {
        self.shares.iter().sum()
    }
}

/// Split `total` into `ways` parts, last part absorbing the remainder.
///
/// `floor` is the mathematical floor, so negative totals keep the same shape
/// (equal leading parts, last part differing by less than `ways` cents).
pub fn apportion(total: MoneyCents, ways: u32) -> ResultEngine<Vec<MoneyCents>> {
    if !(2..=MAX_WAYS).contains(&ways) {
        return Err(EngineError::InvalidWays(ways));
    }
    let ways_i = i64::from(ways);
    let base = total.cents().div_euclid(ways_i);
    let leading = base
        .checked_mul(ways_i - 1)
        .ok_or_else(|| EngineError::InvalidAmount(format!("cannot split {total} {ways} ways")))?;
    let last = total
        .cents()
        .checked_sub(leading)
        .ok_or_else(|| EngineError::InvalidAmount(format!("cannot split {total} {ways} ways")))?;

    let mut parts = vec![MoneyCents::new(base); ways as usize - 1];
    parts.push(MoneyCents::new(last));
    Ok(parts)
}

/// Even split of an order total.
pub fn compute_even_split(total: MoneyCents, num_ways: u32) -> ResultEngine<EvenSplitResult> {
    let shares = apportion(total, num_ways)?;
    Ok(EvenSplitResult { num_ways, shares })
}

/// Claim amounts for one line item split `ways` ways.
///
/// Claims are ownership of a cost, so a negative line (a comp or discount)
/// cannot be fragmented.
pub fn fragment_item(item_total: MoneyCents, ways: u32) -> ResultEngine<Vec<MoneyCents>> {
    if item_total.is_negative() {
        return Err(EngineError::InvalidAmount(format!(
            "cannot split a negative line total ({item_total})"
        )));
    }
    apportion(item_total, ways)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(values: &[i64]) -> Vec<MoneyCents> {
        values.iter().copied().map(MoneyCents::new).collect()
    }

    #[test]
    fn even_split_of_47_three_ways() {
        let result = compute_even_split(MoneyCents::new(4700), 3).unwrap();
        assert_eq!(result.num_ways, 3);
        assert_eq!(result.shares, cents(&[1566, 1566, 1568]));
        assert_eq!(result.total(), MoneyCents::new(4700));
    }

    #[test]
    fn fragment_ten_dollars_three_ways() {
        let claims = fragment_item(MoneyCents::new(1000), 3).unwrap();
        assert_eq!(claims, cents(&[333, 333, 334]));
    }

    #[test]
    fn exact_division_has_no_remainder() {
        assert_eq!(
            apportion(MoneyCents::new(1200), 4).unwrap(),
            cents(&[300, 300, 300, 300])
        );
    }

    #[test]
    fn rejects_fewer_than_two_ways() {
        assert_eq!(
            compute_even_split(MoneyCents::new(100), 1),
            Err(EngineError::InvalidWays(1))
        );
        assert_eq!(
            fragment_item(MoneyCents::new(100), 0),
            Err(EngineError::InvalidWays(0))
        );
    }

    #[test]
    fn rejects_more_than_max_ways() {
        assert_eq!(apportion(MoneyCents::new(100), MAX_WAYS).unwrap().len(), 100);
        assert_eq!(
            compute_even_split(MoneyCents::new(100), MAX_WAYS + 1),
            Err(EngineError::InvalidWays(MAX_WAYS + 1))
        );
        assert_eq!(
            fragment_item(MoneyCents::new(100), u32::MAX),
            Err(EngineError::InvalidWays(u32::MAX))
        );
    }

    #[test]
    fn rejects_negative_item_fragmentation() {
        assert!(matches!(
            fragment_item(MoneyCents::new(-500), 2),
            Err(EngineError::InvalidAmount(_))
        ));
    }

    #[test]
    fn amounts_smaller_than_ways_land_on_last_part() {
        assert_eq!(apportion(MoneyCents::new(2), 3).unwrap(), cents(&[0, 0, 2]));
        assert_eq!(apportion(MoneyCents::ZERO, 2).unwrap(), cents(&[0, 0]));
    }

    #[test]
    fn negative_totals_floor_toward_minus_infinity() {
        let parts = apportion(MoneyCents::new(-1000), 3).unwrap();
        assert_eq!(parts, cents(&[-334, -334, -332]));
        assert_eq!(parts.iter().sum::<MoneyCents>(), MoneyCents::new(-1000));
    }

    #[test]
    fn parts_always_sum_and_remainder_is_bounded() {
        for total in [1, 7, 99, 100, 101, 4700, 12_345, 99_999, 1_000_003] {
            for ways in 2..=12u32 {
                let parts = apportion(MoneyCents::new(total), ways).unwrap();
                assert_eq!(parts.len(), ways as usize);
                assert_eq!(parts.iter().sum::<MoneyCents>().cents(), total);

                let base = parts[0];
                assert!(parts[..parts.len() - 1].iter().all(|p| *p == base));
                let last = parts[parts.len() - 1];
                assert!(last >= base);
                assert!(last.cents() - base.cents() < i64::from(ways));
            }
        }
    }
}
