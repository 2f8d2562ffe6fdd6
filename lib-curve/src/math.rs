//! Bancor purchase / sale return math.
//!
//! With reserve ratio `r = RESERVE_RATIO / PPM ≈ 1/3`:
//!
//! ```text
//! purchase(supply, reserve, v) = supply · ((1 + v/reserve)^r − 1)
//! sale(supply, reserve, t)     = reserve · (1 − (1 − t/supply)^(1/r))
//! ```
//!
//! Both are computed through the two-regime power approximation in
//! `lib-fixed`. The sale path rewrites `(1 − y)^(1/r)` as
//! `1 / (1 + y/(1−y))^(1/r)` so the approximation only ever sees a
//! `(1 + x)^n` form with non-negative `x`.
//!
//! `supply` here is always the EFFECTIVE supply: real supply plus the
//! virtual [`INITIAL_SUPPLY`], which keeps the formulas defined at zero
//! real supply and bounds the initial price. Likewise the reserve includes
//! the virtual [`INITIAL_RESERVE`] seeded at curve construction.

use lib_fixed::{div_wad, div_wad_up, mul_div, mul_wad, pow_one_plus, FixedPointResult};
use lib_types::{Amount, COIN, PPM, WAD};

// ============================================================================
// CURVE CONSTANTS
// ============================================================================

/// Bancor reserve ratio in parts-per-million (≈ 1/3)
pub const RESERVE_RATIO: Amount = 333_333;

/// Trading fee in basis points (1%)
pub const FEE_BPS: Amount = 100;

/// Creator share of the trading fee, in basis points of trade value
pub const FEE_CREATOR_BPS: Amount = 50;

/// Protocol share of the trading fee, in basis points of trade value
pub const FEE_PROTOCOL_BPS: Amount = 30;

/// Staker-pool share of the trading fee, in basis points of trade value
pub const FEE_STAKER_BPS: Amount = 20;

/// Virtual reserve seeded at construction (10 coin)
pub const INITIAL_RESERVE: Amount = 10 * COIN;

/// Virtual supply added to the real supply in all curve math (100k tokens)
pub const INITIAL_SUPPLY: Amount = 100_000 * WAD;

/// Buy-direction exponent: RESERVE_RATIO / PPM as a wad
pub const EXPONENT_BUY: Amount = RESERVE_RATIO * WAD / PPM;

/// Sell-direction exponent: PPM / RESERVE_RATIO as a wad
pub const EXPONENT_SELL: Amount = 3_000_003_000_003_000_003;

// The split components must account for the whole fee.
const _: () = assert!(
    FEE_CREATOR_BPS + FEE_PROTOCOL_BPS + FEE_STAKER_BPS == FEE_BPS,
    "Fee split must sum to the total fee"
);

// ============================================================================
// RETURN FORMULAS
// ============================================================================

/// Tokens minted for a deposit of `value` coin.
///
/// Returns 0 when any operand is zero. Monotone non-decreasing in `value`
/// and biased low (see `lib-fixed`), so a buy followed by a sell can never
/// extract more than the deposit.
pub fn calc_purchase_return(
    supply: Amount,
    reserve: Amount,
    value: Amount,
) -> FixedPointResult<Amount> {
    if supply == 0 || reserve == 0 || value == 0 {
        return Ok(0);
    }

    let ratio = div_wad(value, reserve)?;
    let growth = pow_one_plus(ratio, EXPONENT_BUY)?;
    mul_wad(supply, growth - WAD)
}

/// Coin released for selling `amount` tokens, before fees.
///
/// Saturates at `reserve`: the curve can never owe more than it holds.
/// Monotone non-decreasing in `amount`.
pub fn calc_sale_return(
    supply: Amount,
    reserve: Amount,
    amount: Amount,
) -> FixedPointResult<Amount> {
    if supply == 0 || reserve == 0 || amount == 0 {
        return Ok(0);
    }
    if amount >= supply {
        return Ok(reserve);
    }

    // (1 − t/s)^n == 1 / (1 + t/(s−t))^n; the reciprocal rounds up so the
    // reserve keeps every wei of dust.
    let ratio = div_wad(amount, supply - amount)?;
    let growth = pow_one_plus(ratio, EXPONENT_SELL)?;
    let retained = div_wad_up(WAD, growth)?;
    let payout = mul_wad(reserve, WAD - retained)?;
    Ok(payout.min(reserve))
}

/// Instantaneous marginal price in coin-per-token (wad):
/// `reserve · PPM / (supply · RESERVE_RATIO / 1e18)`
pub fn spot_price(supply: Amount, reserve: Amount) -> FixedPointResult<Amount> {
    let weighted_supply = mul_div(supply, RESERVE_RATIO, WAD)?;
    mul_div(reserve, PPM, weighted_supply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_fixed::FixedPointError;
    use proptest::prelude::*;

    #[test]
    fn test_exponents_are_inverses() {
        assert_eq!(EXPONENT_BUY, 333_333_000_000_000_000);
        assert_eq!(div_wad(WAD, EXPONENT_BUY).unwrap(), EXPONENT_SELL);
    }

    #[test]
    fn test_purchase_zero_operands() {
        assert_eq!(calc_purchase_return(0, INITIAL_RESERVE, COIN).unwrap(), 0);
        assert_eq!(calc_purchase_return(INITIAL_SUPPLY, 0, COIN).unwrap(), 0);
        assert_eq!(calc_purchase_return(INITIAL_SUPPLY, INITIAL_RESERVE, 0).unwrap(), 0);
    }

    #[test]
    fn test_purchase_from_genesis_state() {
        // 1 coin into the virgin curve: ratio 0.1, growth floored at the
        // linear boundary, 0.0333333 of the virtual supply minted.
        let minted = calc_purchase_return(INITIAL_SUPPLY, INITIAL_RESERVE, COIN).unwrap();
        assert_eq!(minted, 3_333_330_000_000_000_000_000);
    }

    #[test]
    fn test_sale_saturates_at_reserve() {
        let out = calc_sale_return(INITIAL_SUPPLY, INITIAL_RESERVE, INITIAL_SUPPLY).unwrap();
        assert_eq!(out, INITIAL_RESERVE);

        let out = calc_sale_return(INITIAL_SUPPLY, INITIAL_RESERVE, 2 * INITIAL_SUPPLY).unwrap();
        assert_eq!(out, INITIAL_RESERVE);
    }

    #[test]
    fn test_spot_price_at_genesis() {
        // reserve 10, ratio-weighted supply ≈ 100_000 / 3 → price ≈ 3.000003e-4
        let price = spot_price(INITIAL_SUPPLY, INITIAL_RESERVE).unwrap();
        assert_eq!(price, 300_000_300_000_300);
    }

    #[test]
    fn test_spot_price_zero_supply_is_an_error() {
        assert!(matches!(
            spot_price(0, INITIAL_RESERVE),
            Err(FixedPointError::DivisionByZero)
        ));
    }

    #[test]
    fn test_price_rises_with_buys() {
        let mut supply = INITIAL_SUPPLY;
        let mut reserve = INITIAL_RESERVE;
        let mut last_price = spot_price(supply, reserve).unwrap();

        for _ in 0..5 {
            let minted = calc_purchase_return(supply, reserve, COIN).unwrap();
            supply += minted;
            reserve += COIN;
            let price = spot_price(supply, reserve).unwrap();
            assert!(price > last_price, "price must strictly rise on buys");
            last_price = price;
        }
    }

    proptest! {
        /// CalcBuy is monotone non-decreasing in the deposit.
        #[test]
        fn prop_purchase_monotone(
            reserve in INITIAL_RESERVE..1_000 * COIN,
            extra_supply in 0u128..1_000_000 * WAD,
            v1 in 0u128..100 * COIN,
            v2 in 0u128..100 * COIN,
        ) {
            let supply = INITIAL_SUPPLY + extra_supply;
            let (lo, hi) = if v1 <= v2 { (v1, v2) } else { (v2, v1) };
            let out_lo = calc_purchase_return(supply, reserve, lo).unwrap();
            let out_hi = calc_purchase_return(supply, reserve, hi).unwrap();
            prop_assert!(out_lo <= out_hi);
        }

        /// CalcSell is monotone non-decreasing in the token amount.
        #[test]
        fn prop_sale_monotone(
            reserve in INITIAL_RESERVE..1_000 * COIN,
            extra_supply in 1u128..1_000_000 * WAD,
            t1 in 0u128..1_000_000 * WAD,
            t2 in 0u128..1_000_000 * WAD,
        ) {
            let supply = INITIAL_SUPPLY + extra_supply;
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            let out_lo = calc_sale_return(supply, reserve, lo).unwrap();
            let out_hi = calc_sale_return(supply, reserve, hi).unwrap();
            prop_assert!(out_lo <= out_hi);
        }

        /// Round trip: selling what a deposit just bought, at the post-buy
        /// state, never yields more than the deposit (fees ignored).
        #[test]
        fn prop_round_trip_bound(
            reserve in INITIAL_RESERVE..1_000 * COIN,
            extra_supply in 0u128..1_000_000 * WAD,
            value in 1u128..100 * COIN,
        ) {
            let supply = INITIAL_SUPPLY + extra_supply;
            let bought = calc_purchase_return(supply, reserve, value).unwrap();
            let back = calc_sale_return(supply + bought, reserve + value, bought).unwrap();
            prop_assert!(back <= value);
        }

        /// Sell-everything solvency: liquidating the entire real supply
        /// leaves at least the virtual reserve behind.
        #[test]
        fn prop_virtual_reserve_never_paid_out(
            deposits in proptest::collection::vec(1u128..50 * COIN, 1..8),
        ) {
            let mut supply = INITIAL_SUPPLY;
            let mut reserve = INITIAL_RESERVE;
            for v in deposits {
                supply += calc_purchase_return(supply, reserve, v).unwrap();
                reserve += v;
            }
            let real_supply = supply - INITIAL_SUPPLY;
            let payout = calc_sale_return(supply, reserve, real_supply).unwrap();
            prop_assert!(payout <= reserve - INITIAL_RESERVE);
        }
    }
}
