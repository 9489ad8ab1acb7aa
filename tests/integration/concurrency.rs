//! Shared pools under concurrent access.

use std::sync::Arc;
use std::thread;

use amm_arb::arbitrage::ArbitrageExecutor;
use amm_arb::error::PoolError;
use amm_arb::ledger::{AccountId, TokenLedger};
use amm_arb::pool::SwapDirection;
use amm_arb::Config;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::helpers::Market;

const THREADS: usize = 8;
const ROUNDS: usize = 50;

#[test]
fn concurrent_operations_preserve_invariants() {
    let market = Arc::new(Market::new());
    let pool = market.pool(dec!(10000), dec!(20000));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let market = Arc::clone(&market);
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                let trader = market.trader(&format!("trader-{i}"), dec!(100000));
                market.approve_pool(&trader, &pool, dec!(100000), dec!(100000));

                for round in 0..ROUNDS {
                    let direction = if (i + round) % 2 == 0 {
                        SwapDirection::AToB
                    } else {
                        SwapDirection::BToA
                    };
                    pool.swap(&trader, direction, dec!(3)).unwrap();

                    if round % 10 == 0 {
                        let snapshot = pool.snapshot().unwrap();
                        let amount_a = dec!(5);
                        let amount_b = (amount_a * snapshot.reserve_b / snapshot.reserve_a).round_dp(18);
                        match pool.deposit(&trader, amount_a, amount_b) {
                            // another thread moved the price in between
                            Ok(_) | Err(PoolError::RatioMismatch { .. }) => {}
                            Err(err) => panic!("deposit failed: {err}"),
                        }
                    }
                }

                let shares = pool.shares_of(&trader);
                if shares > Decimal::ZERO {
                    pool.withdraw(&trader, shares).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(pool.invariants_hold());
    assert_eq!(pool.total_shares(), pool.shares_of(&market.lp));
    assert_eq!(market.token_a.balance_of(pool.account()), pool.reserve_a());
    assert_eq!(market.token_b.balance_of(pool.account()), pool.reserve_b());
}

#[test]
fn opposite_executors_do_not_deadlock() {
    let market = Arc::new(Market::new());
    let pool_x = market.pool(dec!(4000), dec!(5000));
    let pool_y = market.pool(dec!(6000), dec!(5000));

    let executors = [
        ArbitrageExecutor::new(
            AccountId::new("arb-xy"),
            pool_x.clone(),
            pool_y.clone(),
            &Config::default(),
        )
        .unwrap(),
        ArbitrageExecutor::new(
            AccountId::new("arb-yx"),
            pool_y.clone(),
            pool_x.clone(),
            &Config::default(),
        )
        .unwrap(),
    ];

    thread::scope(|scope| {
        for (i, executor) in executors.iter().enumerate() {
            let market = Arc::clone(&market);
            scope.spawn(move || {
                let trader = market.trader(&format!("arber-{i}"), dec!(100000));
                market.token_a.approve(&trader, executor.account(), dec!(100000));
                market.token_b.approve(&trader, executor.account(), dec!(100000));

                for _ in 0..ROUNDS {
                    // most attempts turn unprofitable once the gap closes
                    let _ = executor.execute(&trader, dec!(1));
                }
            });
        }

        let market = Arc::clone(&market);
        let pool_x = Arc::clone(&pool_x);
        scope.spawn(move || {
            let trader = market.trader("noise", dec!(100000));
            market.approve_pool(&trader, &pool_x, dec!(100000), dec!(100000));
            for round in 0..ROUNDS {
                let direction = if round % 2 == 0 {
                    SwapDirection::AToB
                } else {
                    SwapDirection::BToA
                };
                pool_x.swap(&trader, direction, dec!(20)).unwrap();
            }
        });
    });

    for executor in &executors {
        let stats = executor.stats();
        assert_eq!(stats.attempts, ROUNDS as u64);
        assert_eq!(stats.failures, 0);
        assert_eq!(
            market.token_a.balance_of(executor.account()),
            Decimal::ZERO
        );
    }
    assert!(pool_x.invariants_hold());
    assert!(pool_y.invariants_hold());
}
