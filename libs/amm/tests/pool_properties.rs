//! Pool Property Tests
//!
//! Properties that must hold for any reserves and any sequence of operations,
//! independent of specific amounts.

use amm::{quote, Address, InMemoryLedger, Pool, PoolError, SwapDirection};
use proptest::prelude::*;

const ACTORS: [&str; 3] = ["alice", "bob", "carol"];
const FUNDING: u128 = 1_000_000_000_000;

fn actor(index: usize) -> Address {
    Address::from_label(ACTORS[index % ACTORS.len()])
}

fn funded_pool() -> Pool {
    let pool_addr = Address::from_label("pool");
    let mut native = InMemoryLedger::native();
    let mut token = InMemoryLedger::token();
    for name in ACTORS {
        let who = Address::from_label(name);
        native.mint(who, FUNDING);
        token.mint(who, FUNDING);
        token.approve(who, pool_addr, u128::MAX);
    }
    Pool::new(pool_addr, native, token)
}

#[derive(Debug, Clone)]
enum Op {
    Initialize { who: usize, token: u128, native: u128 },
    Swap { who: usize, direction: SwapDirection, amount: u128 },
    Provide { who: usize, native: u128 },
    Withdraw { who: usize, amount: u128 },
}

prop_compose! {
    fn valid_reserve()
        (reserve in 1u128..10_000_000_000u128) -> u128 {
        reserve
    }
}

prop_compose! {
    fn trade_amount()
        (amount in 1u128..1_000_000_000u128) -> u128 {
        amount
    }
}

fn direction() -> impl Strategy<Value = SwapDirection> {
    prop_oneof![Just(SwapDirection::AToB), Just(SwapDirection::BToA)]
}

fn operation() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, trade_amount(), trade_amount())
            .prop_map(|(who, token, native)| Op::Initialize { who, token, native }),
        (0..3usize, direction(), trade_amount())
            .prop_map(|(who, direction, amount)| Op::Swap { who, direction, amount }),
        (0..3usize, trade_amount()).prop_map(|(who, native)| Op::Provide { who, native }),
        (0..3usize, trade_amount()).prop_map(|(who, amount)| Op::Withdraw { who, amount }),
    ]
}

fn apply(pool: &mut Pool, op: &Op) -> Result<(), PoolError> {
    match *op {
        Op::Initialize { who, token, native } => pool.initialize(actor(who), token, native).map(drop),
        Op::Swap { who, direction, amount } => pool.swap(actor(who), direction, amount).map(drop),
        Op::Provide { who, native } => pool.provide_liquidity(actor(who), native).map(drop),
        Op::Withdraw { who, amount } => {
            // Withdraw at most what the actor holds so most attempts succeed
            let held = pool.share_of(&actor(who));
            let amount = if held == 0 { amount } else { amount % held + 1 };
            pool.withdraw_liquidity(actor(who), amount).map(drop)
        }
    }
}

proptest! {
    #[test]
    fn prop_fee_strictly_reduces_output(
        input in trade_amount(),
        reserve_in in valid_reserve(),
        reserve_out in valid_reserve(),
    ) {
        let output = quote(input, reserve_in, reserve_out).unwrap();
        // output < input * reserve_out / reserve_in, compared without division
        prop_assert!(output * reserve_in < input * reserve_out);
        prop_assert!(output < reserve_out);
    }

    #[test]
    fn prop_output_monotonic_in_input(
        a in trade_amount(),
        b in trade_amount(),
        reserve_in in valid_reserve(),
        reserve_out in valid_reserve(),
    ) {
        let (small, large) = if a <= b { (a, b) } else { (b, a) };
        let out_small = quote(small, reserve_in, reserve_out).unwrap();
        let out_large = quote(large, reserve_in, reserve_out).unwrap();
        prop_assert!(out_small <= out_large);
    }

    #[test]
    fn prop_initializer_owns_all_shares(token in trade_amount(), native in trade_amount()) {
        let mut pool = funded_pool();
        let total = pool.initialize(actor(0), token, native).unwrap();

        prop_assert_eq!(total, native);
        prop_assert_eq!(pool.share_of(&actor(0)), pool.total_shares());
        prop_assert_eq!(pool.reserves().native, native);
        prop_assert_eq!(pool.reserves().token, token);
    }

    #[test]
    fn prop_provide_then_withdraw_never_profits(
        init_token in trade_amount(),
        init_native in trade_amount(),
        swap_in in proptest::option::of(trade_amount()),
        deposit in trade_amount(),
    ) {
        let mut pool = funded_pool();
        let lp = actor(0);
        pool.initialize(lp, init_token, init_native).unwrap();
        if let Some(amount) = swap_in {
            pool.swap_b_to_a(actor(1), amount).unwrap();
        }

        let total_before = pool.total_shares();
        let shares_before = pool.share_of(&lp);
        // Deposits can outrun the provider's token balance on lopsided pools
        let Ok(token_paid) = pool.provide_liquidity(lp, deposit) else {
            return Ok(());
        };
        let minted = pool.share_of(&lp) - shares_before;
        if minted == 0 {
            return Ok(());
        }

        let (native_back, token_back) = pool.withdraw_liquidity(lp, minted).unwrap();

        prop_assert!(native_back <= deposit);
        prop_assert!(token_back <= token_paid);
        prop_assert_eq!(pool.total_shares(), total_before);
    }

    #[test]
    fn prop_invariants_hold_after_any_sequence(ops in prop::collection::vec(operation(), 1..40)) {
        let mut pool = funded_pool();
        for op in &ops {
            let total_before = pool.total_shares();
            let result = apply(&mut pool, op);
            if result.is_err() {
                prop_assert_eq!(pool.total_shares(), total_before);
            }
            pool.check_invariants().unwrap();
        }
    }

    #[test]
    fn prop_oversized_withdraw_moves_nothing(native in trade_amount(), token in trade_amount(), extra in 1u128..1000) {
        let mut pool = funded_pool();
        pool.initialize(actor(0), token, native).unwrap();
        let reserves = pool.reserves();

        let err = pool.withdraw_liquidity(actor(0), native + extra).unwrap_err();

        let is_insufficient = matches!(err, PoolError::InsufficientShares { .. });
        prop_assert!(is_insufficient);
        prop_assert_eq!(pool.reserves(), reserves);
        prop_assert_eq!(pool.share_of(&actor(0)), native);
    }
}
