//! End-to-end pool and arbitrage scenarios.

use amm_arb::arbitrage::ArbitrageExecutor;
use amm_arb::error::{ArbitrageError, PoolError};
use amm_arb::ledger::{AccountId, TokenLedger};
use amm_arb::pool::SwapDirection;
use amm_arb::Config;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::helpers::Market;

#[test]
fn first_deposit_sets_price() {
    let market = Market::new();
    let pool = market.empty_pool();
    market.approve_pool(&market.lp, &pool, dec!(10), dec!(20));

    let shares = pool.deposit(&market.lp, dec!(10), dec!(20)).unwrap();

    assert_eq!(pool.spot_price().unwrap(), dec!(0.5));
    assert!(shares > dec!(14.142) && shares < dec!(14.143));
    assert_eq!(pool.reserve_lpt(), shares);
    assert_eq!(pool.lpt_balance_of(&market.lp), shares);
}

#[test]
fn swap_charges_fee_on_input() {
    let market = Market::new();
    let pool = market.pool(dec!(200), dec!(300));
    let trader = market.trader("trader", dec!(50));
    market.approve_pool(&trader, &pool, dec!(50), Decimal::ZERO);

    let out = pool.swap_a_for_b(&trader, dec!(50)).unwrap();

    // 300 * 49.85 / 249.85
    assert!(out > dec!(59.855) && out < dec!(59.857));
    assert_eq!(pool.reserve_a(), dec!(250));
    assert_eq!(pool.reserve_b(), dec!(300) - out);
    assert_eq!(pool.fee_a(), dec!(0.15));
    assert_eq!(market.balances(&trader), (Decimal::ZERO, dec!(50) + out));
}

#[test]
fn sole_provider_withdraws_everything() {
    let market = Market::new();
    let pool = market.pool(dec!(10), dec!(20));
    let shares = pool.shares_of(&market.lp);

    let (a, b) = pool.withdraw(&market.lp, shares).unwrap();

    assert_eq!((a, b), (dec!(10), dec!(20)));
    assert_eq!(pool.total_shares(), Decimal::ZERO);
    assert_eq!(pool.reserve_a(), Decimal::ZERO);
    assert_eq!(pool.reserve_b(), Decimal::ZERO);
    assert_eq!(pool.spot_price().unwrap_err(), PoolError::DivisionByZero);
    assert_eq!(market.balances(pool.account()), (Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn emptied_pool_can_be_reseeded() {
    let market = Market::new();
    let pool = market.pool(dec!(10), dec!(20));
    pool.withdraw(&market.lp, pool.shares_of(&market.lp)).unwrap();
    market.approve_pool(&market.lp, &pool, dec!(30), dec!(30));

    let shares = pool.deposit(&market.lp, dec!(30), dec!(30)).unwrap();

    assert_eq!(shares, dec!(30));
    assert_eq!(pool.spot_price().unwrap(), Decimal::ONE);
}

#[test]
fn exact_ratio_deposit_round_trips() {
    let market = Market::new();
    let pool = market.pool(dec!(100), dec!(400));
    let provider = market.trader("provider", dec!(1000));
    market.approve_pool(&provider, &pool, dec!(50), dec!(200));

    let shares = pool.deposit(&provider, dec!(50), dec!(200)).unwrap();
    let (a, b) = pool.withdraw(&provider, shares).unwrap();

    assert_eq!(shares, dec!(100));
    assert_eq!((a, b), (dec!(50), dec!(200)));
    assert_eq!(market.balances(&provider), (dec!(1000), dec!(1000)));
    assert!(pool.invariants_hold());
}

#[test]
fn off_ratio_deposit_is_rejected() {
    let market = Market::new();
    let pool = market.pool(dec!(100), dec!(400));
    market.approve_pool(&market.lp, &pool, dec!(50), dec!(100));
    let before = pool.snapshot().unwrap();

    let err = pool.deposit(&market.lp, dec!(50), dec!(100)).unwrap_err();

    assert!(matches!(err, PoolError::RatioMismatch { .. }));
    assert_eq!(pool.snapshot().unwrap(), before);
}

#[test]
fn zero_amounts_fail_without_mutation() {
    let market = Market::new();
    let pool = market.pool(dec!(100), dec!(400));
    let before = pool.snapshot().unwrap();

    assert_eq!(
        pool.deposit(&market.lp, Decimal::ZERO, dec!(1)).unwrap_err(),
        PoolError::InvalidAmount(Decimal::ZERO)
    );
    assert_eq!(
        pool.swap_a_for_b(&market.lp, Decimal::ZERO).unwrap_err(),
        PoolError::InvalidAmount(Decimal::ZERO)
    );
    assert_eq!(
        pool.withdraw(&market.lp, Decimal::ZERO).unwrap_err(),
        PoolError::InvalidAmount(Decimal::ZERO)
    );
    assert_eq!(pool.snapshot().unwrap(), before);
}

#[test]
fn swaps_never_shrink_the_reserve_product() {
    let market = Market::new();
    let pool = market.pool(dec!(1000), dec!(2000));
    let trader = market.trader("trader", dec!(10000));
    market.approve_pool(&trader, &pool, dec!(10000), dec!(10000));

    let mut product = pool.reserve_a() * pool.reserve_b();
    for (direction, amount) in [
        (SwapDirection::AToB, dec!(10)),
        (SwapDirection::BToA, dec!(37.5)),
        (SwapDirection::AToB, dec!(250)),
        (SwapDirection::BToA, dec!(0.001)),
        (SwapDirection::BToA, dec!(900)),
    ] {
        pool.swap(&trader, direction, amount).unwrap();
        let next = pool.reserve_a() * pool.reserve_b();
        assert!(next >= product, "{direction} {amount}: {next} < {product}");
        product = next;
    }
}

#[test]
fn snapshot_serializes_to_json() {
    let market = Market::new();
    let pool = market.pool(dec!(100), dec!(400));

    let json = serde_json::to_value(pool.snapshot().unwrap()).unwrap();

    assert_eq!(json["reserve_a"], "100");
    assert_eq!(json["spot_price"], "0.25");
    assert_eq!(json["providers"], 1);
}

#[test]
fn arbitrage_profits_from_price_gap() {
    let market = Market::new();
    let pool_1 = market.pool(dec!(400), dec!(500));
    let pool_2 = market.pool(dec!(600), dec!(500));
    let trader = market.trader("trader", dec!(20));
    let executor = ArbitrageExecutor::new(
        AccountId::new("arb"),
        pool_1.clone(),
        pool_2.clone(),
        &Config::default(),
    )
    .unwrap();
    market.token_a.approve(&trader, executor.account(), dec!(20));

    let report = executor.execute(&trader, dec!(20)).unwrap();

    assert_eq!(report.route.leg_1, SwapDirection::AToB);
    assert_eq!(report.route.leg_2, SwapDirection::BToA);
    assert!(report.profit > dec!(7) && report.profit < dec!(7.2));
    assert_eq!(market.token_a.balance_of(&trader), dec!(20) + report.profit);
    // pool 1 gained A and lost B, pool 2 the reverse
    assert_eq!(pool_1.reserve_a(), dec!(420));
    assert_eq!(pool_2.reserve_b(), dec!(500) + report.leg_1.amount_out);
    assert!(pool_1.spot_price().unwrap() > dec!(0.8));
    assert!(pool_2.spot_price().unwrap() < dec!(1.2));
}

#[test]
fn mirrored_gap_is_traded_from_token_b() {
    let market = Market::new();
    let pool_1 = market.pool(dec!(600), dec!(500));
    let pool_2 = market.pool(dec!(400), dec!(500));
    let trader = market.trader("trader", dec!(20));
    let executor = ArbitrageExecutor::new(
        AccountId::new("arb"),
        pool_1.clone(),
        pool_2.clone(),
        &Config::default(),
    )
    .unwrap();
    market.token_b.approve(&trader, executor.account(), dec!(20));

    let report = executor.execute(&trader, dec!(20)).unwrap();

    assert_eq!(report.route.leg_1, SwapDirection::BToA);
    assert_eq!(report.route.leg_2, SwapDirection::AToB);
    assert_eq!(&report.profit_token, market.token_b.id());
    assert_eq!(market.balances(&trader), (dec!(20), dec!(20) + report.profit));
    assert_eq!(executor.stats().profit_b, report.profit);
}

#[test]
fn arbitrage_below_fee_hurdle_changes_nothing() {
    let market = Market::new();
    let pool_1 = market.pool(dec!(1000), dec!(1000));
    let pool_2 = market.pool(dec!(1004), dec!(1000));
    let trader = market.trader("trader", dec!(10));
    let executor = ArbitrageExecutor::new(
        AccountId::new("arb"),
        pool_1.clone(),
        pool_2.clone(),
        &Config::default(),
    )
    .unwrap();
    market.token_a.approve(&trader, executor.account(), dec!(10));
    let snapshots = (pool_1.snapshot().unwrap(), pool_2.snapshot().unwrap());

    let err = executor.execute(&trader, dec!(1)).unwrap_err();

    assert!(matches!(err, ArbitrageError::Unprofitable { .. }));
    assert_eq!((pool_1.snapshot().unwrap(), pool_2.snapshot().unwrap()), snapshots);
    assert_eq!(market.balances(&trader), (dec!(10), dec!(10)));
    assert_eq!(market.balances(executor.account()), (Decimal::ZERO, Decimal::ZERO));
}

#[test]
fn executor_requires_matching_pair() {
    let market = Market::new();
    let other = Market::new();
    let pool_1 = market.pool(dec!(100), dec!(100));
    let foreign = std::sync::Arc::new(amm_arb::pool::Pool::new(
        other.token_b.clone(),
        other.token_a.clone(),
        &Config::default(),
    ));

    let err = ArbitrageExecutor::new(AccountId::new("arb"), pool_1, foreign, &Config::default())
        .unwrap_err();

    assert_eq!(err, ArbitrageError::MismatchedPools);
}

#[test]
fn optimal_execution_beats_fixed_size() {
    let market = Market::new();
    let trader = market.trader("trader", dec!(1000));

    let fixed = {
        let executor = ArbitrageExecutor::new(
            AccountId::new("arb-fixed"),
            market.pool(dec!(400), dec!(500)),
            market.pool(dec!(600), dec!(500)),
            &Config::default(),
        )
        .unwrap();
        market.token_a.approve(&trader, executor.account(), dec!(1000));
        executor.execute(&trader, dec!(20)).unwrap()
    };
    let optimal = {
        let executor = ArbitrageExecutor::new(
            AccountId::new("arb-optimal"),
            market.pool(dec!(400), dec!(500)),
            market.pool(dec!(600), dec!(500)),
            &Config::default(),
        )
        .unwrap();
        market.token_a.approve(&trader, executor.account(), dec!(1000));
        executor.execute_optimal(&trader, dec!(1000)).unwrap()
    };

    assert!(optimal.profit >= fixed.profit);
    assert!(optimal.amount_in < dec!(1000));
}
