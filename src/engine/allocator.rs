use crate::domain::{Amount, AmountError, AssetLot, Transaction, TransactionKind};
use std::cmp::Ordering;
use thiserror::Error;

/// Shares drawn from one lot to satisfy part of an outflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// State of the lot after the draw.
    pub lot: AssetLot,
    pub drawn: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("allocation shortfall for {security}: requested {requested}, available {available}")]
    Shortfall {
        security: String,
        requested: Amount,
        available: Amount,
    },
    #[error("cannot allocate a negative quantity: {0}")]
    NegativeQuantity(Amount),
}

/// Lot selection and consumption for outflow events.
///
/// Lots are consumed highest cost basis first. Ties break by creation date,
/// then lot id, so the same ledger always allocates the same way.
pub struct Allocator;

impl Allocator {
    /// Selection order: cost basis descending, then oldest, then lot id.
    pub fn selection_order(a: &AssetLot, b: &AssetLot) -> Ordering {
        b.cost_basis_per_share
            .cmp(&a.cost_basis_per_share)
            .then_with(|| a.created_date.cmp(&b.created_date))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Draw `requested` shares from `lots`.
    ///
    /// Nothing is consumed unless the whole request can be satisfied.
    ///
    /// # Errors
    /// Returns `AllocationError::Shortfall` when the open lots hold fewer
    /// shares than requested.
    pub fn allocate(
        security: &str,
        lots: &[AssetLot],
        requested: Amount,
    ) -> Result<Vec<Allocation>, AllocationError> {
        if requested.is_negative() {
            return Err(AllocationError::NegativeQuantity(requested));
        }

        let mut ordered: Vec<AssetLot> = lots
            .iter()
            .filter(|lot| lot.shares.is_positive())
            .cloned()
            .collect();
        ordered.sort_by(Self::selection_order);

        let available: Amount = ordered.iter().map(|lot| lot.shares).sum();
        if requested > available {
            return Err(AllocationError::Shortfall {
                security: security.to_string(),
                requested,
                available,
            });
        }

        let mut remaining = requested;
        let mut allocations = Vec::new();
        for mut lot in ordered {
            if remaining.is_zero() {
                break;
            }
            let drawn = lot.shares.min(remaining);
            lot.shares -= drawn;
            remaining -= drawn;
            allocations.push(Allocation { lot, drawn });
        }

        Ok(allocations)
    }

    /// Draw every open lot down to zero.
    pub fn drain(lots: &[AssetLot]) -> Vec<Allocation> {
        let mut ordered: Vec<AssetLot> = lots
            .iter()
            .filter(|lot| lot.shares.is_positive())
            .cloned()
            .collect();
        ordered.sort_by(Self::selection_order);

        ordered
            .into_iter()
            .map(|mut lot| {
                let drawn = lot.shares;
                lot.shares = Amount::zero();
                Allocation { lot, drawn }
            })
            .collect()
    }

    /// Generate one transaction per allocation from the originating event.
    ///
    /// For sales the whole fee lands on the first generated transaction so
    /// the net totals sum to `price * shares - fee`. Transfers and splits
    /// carry neither value nor fee.
    ///
    /// # Errors
    /// Returns `AmountError::Overflow` when a derived total is out of range.
    pub fn lot_transactions(
        template: &Transaction,
        allocations: &[Allocation],
    ) -> Result<Vec<Transaction>, AmountError> {
        allocations
            .iter()
            .enumerate()
            .map(|(index, allocation)| {
                let tx = template.for_lot(allocation.lot.id.clone(), allocation.drawn)?;
                if index == 0 && template.kind == TransactionKind::Sale {
                    tx.with_fees(template.fees)
                } else {
                    Ok(tx)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, LotId};
    use chrono::NaiveDate;

    fn d(s: &str) -> Amount {
        s.parse().unwrap()
    }

    fn lot(id: &str, basis: &str, shares: &str, day: u32) -> AssetLot {
        AssetLot {
            id: LotId::new(id.to_string()),
            symbol: "AAPL".to_string(),
            isin: None,
            shares: d(shares),
            cost_basis_per_share: d(basis),
            cost_basis_currency: Currency::Usd,
            created_date: NaiveDate::from_ymd_opt(2020, 1, day).unwrap(),
        }
    }

    fn ids(allocations: &[Allocation]) -> Vec<&str> {
        allocations.iter().map(|a| a.lot.id.as_str()).collect()
    }

    #[test]
    fn test_highest_basis_drawn_first() {
        let lots = vec![lot("a", "50", "10", 1), lot("b", "30", "10", 2), lot("c", "70", "10", 3)];
        let allocations = Allocator::allocate("AAPL", &lots, d("4")).unwrap();
        assert_eq!(ids(&allocations), vec!["c"]);
        assert_eq!(allocations[0].drawn, d("4"));
        assert_eq!(allocations[0].lot.shares, d("6"));
    }

    #[test]
    fn test_spans_lots_in_basis_order() {
        let lots = vec![lot("low", "60", "5", 1), lot("high", "80", "5", 2)];
        let allocations = Allocator::allocate("AAPL", &lots, d("8")).unwrap();
        assert_eq!(ids(&allocations), vec!["high", "low"]);
        assert_eq!(allocations[0].drawn, d("5"));
        assert_eq!(allocations[0].lot.shares, Amount::zero());
        assert_eq!(allocations[1].drawn, d("3"));
        assert_eq!(allocations[1].lot.shares, d("2"));
    }

    #[test]
    fn test_equal_basis_breaks_ties_by_date_then_id() {
        let lots = vec![lot("z", "10", "1", 5), lot("y", "10", "1", 2), lot("x", "10", "1", 2)];
        let allocations = Allocator::allocate("AAPL", &lots, d("3")).unwrap();
        assert_eq!(ids(&allocations), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_closed_lots_are_skipped() {
        let lots = vec![lot("closed", "99", "0", 1), lot("open", "10", "2", 2)];
        let allocations = Allocator::allocate("AAPL", &lots, d("1")).unwrap();
        assert_eq!(ids(&allocations), vec!["open"]);
    }

    #[test]
    fn test_shortfall_is_an_error() {
        let lots = vec![lot("a", "10", "3", 1)];
        let err = Allocator::allocate("AAPL", &lots, d("5")).unwrap_err();
        assert_eq!(
            err,
            AllocationError::Shortfall {
                security: "AAPL".to_string(),
                requested: d("5"),
                available: d("3"),
            }
        );
    }

    #[test]
    fn test_zero_request_allocates_nothing() {
        let lots = vec![lot("a", "10", "3", 1)];
        assert!(Allocator::allocate("AAPL", &lots, Amount::zero()).unwrap().is_empty());
        assert!(matches!(
            Allocator::allocate("AAPL", &lots, d("-1")),
            Err(AllocationError::NegativeQuantity(_))
        ));
    }

    #[test]
    fn test_drain_zeroes_every_open_lot() {
        let lots = vec![lot("a", "10", "3", 1), lot("b", "20", "0", 1), lot("c", "5", "7", 2)];
        let allocations = Allocator::drain(&lots);
        assert_eq!(ids(&allocations), vec!["a", "c"]);
        assert!(allocations.iter().all(|a| a.lot.shares.is_zero()));
        assert_eq!(allocations[1].drawn, d("7"));
    }

    #[test]
    fn test_sale_fee_only_on_first_transaction() {
        let lots = vec![lot("a", "80", "5", 1), lot("b", "60", "5", 1)];
        let allocations = Allocator::allocate("AAPL", &lots, d("8")).unwrap();
        let template = Transaction::new(
            None,
            TransactionKind::Sale,
            NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            "AAPL".to_string(),
            d("8"),
            d("100"),
            d("10"),
            Currency::Usd,
        )
        .unwrap();
        let txs = Allocator::lot_transactions(&template, &allocations).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].fees, d("10"));
        assert_eq!(txs[1].fees, Amount::zero());
        let net: Amount = txs.iter().map(|t| t.total_amount).sum();
        assert_eq!(net, d("790"));
        assert_eq!(txs[0].lot_id, Some(LotId::new("a".to_string())));
    }

    #[test]
    fn test_transfer_out_carries_no_value_or_fee() {
        let lots = vec![lot("a", "80", "5", 1), lot("b", "60", "5", 1)];
        let allocations = Allocator::allocate("AAPL", &lots, d("6")).unwrap();
        let template = Transaction::new(
            None,
            TransactionKind::TransferOut,
            NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            "AAPL".to_string(),
            d("6"),
            d("100"),
            d("10"),
            Currency::Usd,
        )
        .unwrap();
        let txs = Allocator::lot_transactions(&template, &allocations).unwrap();
        assert!(txs
            .iter()
            .all(|t| t.fees.is_zero() && t.share_value.is_zero() && t.total_amount.is_zero()));
        assert_eq!(txs[1].shares, d("1"));
    }
}
