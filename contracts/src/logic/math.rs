//! Fee and yield arithmetic.
//!
//! Both formulas truncate toward zero and are evaluated strictly left to
//! right, so the exact integer results are part of the vault's observable
//! behavior. Every step is checked.

use crate::config::{BASIS_POINTS_DENOMINATOR, SECONDS_PER_YEAR};
use crate::error::VaultError;
use crate::types::Amount;

/// `amount * fee_bps / 10_000`, truncated.
pub fn deposit_fee(amount: Amount, fee_bps: u16) -> Result<Amount, VaultError> {
    amount
        .checked_mul(fee_bps as Amount)
        .map(|scaled| scaled / BASIS_POINTS_DENOMINATOR)
        .ok_or(VaultError::ArithmeticOverflow)
}

/// `balance * rate_bps / 10_000 * elapsed_secs / SECONDS_PER_YEAR`.
///
/// The division by the denominator happens before the multiplication by
/// elapsed time, so sub-unit remainders from the first step are dropped.
pub fn accrued_yield(balance: Amount, rate_bps: u16, elapsed_secs: u64) -> Result<Amount, VaultError> {
    let annual = balance
        .checked_mul(rate_bps as Amount)
        .ok_or(VaultError::ArithmeticOverflow)?
        / BASIS_POINTS_DENOMINATOR;
    let scaled = annual
        .checked_mul(elapsed_secs as Amount)
        .ok_or(VaultError::ArithmeticOverflow)?;
    Ok(scaled / SECONDS_PER_YEAR as Amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn five_percent_fee() {
        assert_eq!(deposit_fee(100 * ONE, 500).unwrap(), 5 * ONE);
        assert_eq!(deposit_fee(100, 500).unwrap(), 5);
    }

    #[test]
    fn fee_truncates() {
        // 19 * 500 / 10_000 = 0.95
        assert_eq!(deposit_fee(19, 500).unwrap(), 0);
        assert_eq!(deposit_fee(1_999, 1).unwrap(), 0);
    }

    #[test]
    fn fee_bounds() {
        assert_eq!(deposit_fee(1_000, 0).unwrap(), 0);
        assert_eq!(deposit_fee(1_000, 10_000).unwrap(), 1_000);
        assert_eq!(deposit_fee(Amount::MAX, 2), Err(VaultError::ArithmeticOverflow));
    }

    #[test]
    fn one_year_of_yield() {
        let y = accrued_yield(95 * ONE, 500, SECONDS_PER_YEAR).unwrap();
        assert_eq!(y, 4_750_000_000_000_000_000);
    }

    #[test]
    fn yield_is_linear_in_time() {
        let half = accrued_yield(95 * ONE, 500, SECONDS_PER_YEAR / 2).unwrap();
        assert_eq!(half, 2_375_000_000_000_000_000);
    }

    #[test]
    fn small_balances_round_to_zero() {
        // 10 * 500 / 10_000 = 0 before time is applied.
        assert_eq!(accrued_yield(10, 500, SECONDS_PER_YEAR * 10).unwrap(), 0);
        assert_eq!(accrued_yield(1_000, 500, 0).unwrap(), 0);
    }

    #[test]
    fn yield_overflow_is_reported() {
        assert_eq!(accrued_yield(Amount::MAX, 10_000, 1), Err(VaultError::ArithmeticOverflow));
    }
}
