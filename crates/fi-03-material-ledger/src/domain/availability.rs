//! # Availability
//!
//! Derived read model of one material issue. Never persisted.

use crate::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use shared_types::{LedgerAdjustment, MaterialIssue, MaterialReturn, Quantity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub issued: Quantity,
    /// Σ returned quantity, before reversals.
    pub returned: Quantity,
    /// Σ reversed quantity.
    pub reversed: Quantity,
    pub available: Quantity,
}

impl Availability {
    /// Recompute from the issue and all of its rows.
    ///
    /// ## Errors
    ///
    /// - `Inconsistent`: sums overflow or the stored rows already break the
    ///   invariant
    pub fn compute(
        issue: &MaterialIssue,
        returns: &[MaterialReturn],
        adjustments: &[LedgerAdjustment],
    ) -> LedgerResult<Self> {
        let inconsistent = |detail: &str| LedgerError::Inconsistent {
            issue_id: issue.id,
            detail: detail.to_string(),
        };

        let returned = returns
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.returned_quantity))
            .ok_or_else(|| inconsistent("returned total overflows"))?;
        let reversed = adjustments
            .iter()
            .try_fold(0u64, |acc, a| acc.checked_add(a.reversed_quantity))
            .ok_or_else(|| inconsistent("reversed total overflows"))?;
        let net = returned
            .checked_sub(reversed)
            .ok_or_else(|| inconsistent("more reversed than returned"))?;
        let available = issue
            .issued_quantity
            .checked_sub(net)
            .ok_or_else(|| inconsistent("more returned than issued"))?;

        Ok(Self {
            issued: issue.issued_quantity,
            returned,
            reversed,
            available,
        })
    }

    /// Σ returns − Σ reversals.
    #[must_use]
    pub fn net_returned(&self) -> Quantity {
        self.issued - self.available
    }

    /// Accept or reject a return of `requested` units.
    pub fn check_return(&self, issue: &MaterialIssue, requested: Quantity) -> LedgerResult<()> {
        if requested == 0 {
            return Err(LedgerError::ZeroQuantity);
        }
        if requested > self.available {
            return Err(LedgerError::Exceeded {
                issue_id: issue.id,
                requested,
                available: self.available,
                issued: self.issued,
                returned: self.net_returned(),
            });
        }
        Ok(())
    }

    /// Accept or reject a reversal of `requested` units.
    pub fn check_reversal(&self, issue: &MaterialIssue, requested: Quantity) -> LedgerResult<()> {
        if requested == 0 {
            return Err(LedgerError::ZeroQuantity);
        }
        if requested > self.net_returned() {
            return Err(LedgerError::AdjustmentExceedsReturned {
                issue_id: issue.id,
                requested,
                net_returned: self.net_returned(),
            });
        }
        Ok(())
    }
}
