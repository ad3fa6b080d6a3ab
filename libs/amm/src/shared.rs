//! Thread-safe, reentrancy-guarded pool handle
//!
//! Each public operation holds the lock for its full duration, including the
//! nested ledger calls. A ledger hook that calls back into the pool on the same
//! thread gets the lock again but cannot borrow the pool, and is turned away
//! with [`PoolError::Reentrancy`].

use crate::error::{PoolError, PoolResult};
use crate::events::PoolEvent;
use crate::ledger::{Address, AssetLedger, InMemoryLedger};
use crate::pool::{Pool, Reserves};
use crate::pricing::SwapDirection;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tracing::warn;

pub struct SharedPool<N = InMemoryLedger, T = InMemoryLedger> {
    inner: ReentrantMutex<RefCell<Pool<N, T>>>,
}

impl<N: AssetLedger, T: AssetLedger> SharedPool<N, T> {
    pub fn new(pool: Pool<N, T>) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(pool)),
        }
    }

    /// Run `f` with exclusive access to the pool
    pub fn with<R>(&self, f: impl FnOnce(&mut Pool<N, T>) -> PoolResult<R>) -> PoolResult<R> {
        let guard = self.inner.lock();
        let mut pool = guard.try_borrow_mut().map_err(|_| {
            warn!("Rejected re-entrant pool operation");
            PoolError::Reentrancy
        })?;
        f(&mut pool)
    }

    /// Run `f` with shared access; fails while an operation is in flight on this thread
    pub fn read<R>(&self, f: impl FnOnce(&Pool<N, T>) -> R) -> PoolResult<R> {
        let guard = self.inner.lock();
        let pool = guard.try_borrow().map_err(|_| PoolError::Reentrancy)?;
        Ok(f(&pool))
    }

    pub fn initialize(&self, caller: Address, token_amount: u128, attached: u128) -> PoolResult<u128> {
        self.with(|pool| pool.initialize(caller, token_amount, attached))
    }

    pub fn swap(&self, caller: Address, direction: SwapDirection, input_amount: u128) -> PoolResult<u128> {
        self.with(|pool| pool.swap(caller, direction, input_amount))
    }

    pub fn swap_a_to_b(&self, caller: Address, input_amount: u128) -> PoolResult<u128> {
        self.swap(caller, SwapDirection::AToB, input_amount)
    }

    pub fn swap_b_to_a(&self, caller: Address, input_amount: u128) -> PoolResult<u128> {
        self.swap(caller, SwapDirection::BToA, input_amount)
    }

    pub fn provide_liquidity(&self, caller: Address, attached: u128) -> PoolResult<u128> {
        self.with(|pool| pool.provide_liquidity(caller, attached))
    }

    pub fn withdraw_liquidity(&self, caller: Address, amount: u128) -> PoolResult<(u128, u128)> {
        self.with(|pool| pool.withdraw_liquidity(caller, amount))
    }

    pub fn share_of(&self, holder: &Address) -> PoolResult<u128> {
        self.read(|pool| pool.share_of(holder))
    }

    pub fn total_shares(&self) -> PoolResult<u128> {
        self.read(|pool| pool.total_shares())
    }

    pub fn reserves(&self) -> PoolResult<Reserves> {
        self.read(|pool| pool.reserves())
    }

    pub fn take_events(&self) -> PoolResult<Vec<PoolEvent>> {
        self.with(|pool| Ok(pool.take_events()))
    }

    pub fn into_inner(self) -> Pool<N, T> {
        self.inner.into_inner().into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::{Arc, OnceLock, Weak};
    use std::thread;

    fn addr(label: &str) -> Address {
        Address::from_label(label)
    }

    type HostilePool = SharedPool<HostileLedger, InMemoryLedger>;

    /// Native ledger whose payouts to `attacker` call back into the pool
    struct HostileLedger {
        inner: InMemoryLedger,
        attacker: Address,
        pool: Arc<OnceLock<Weak<HostilePool>>>,
        reentry_results: Arc<Mutex<Vec<PoolResult<u128>>>>,
    }

    impl AssetLedger for HostileLedger {
        fn balance_of(&self, owner: &Address) -> u128 {
            self.inner.balance_of(owner)
        }

        fn transfer_from(
            &mut self,
            spender: &Address,
            from: &Address,
            to: &Address,
            amount: u128,
        ) -> bool {
            self.inner.transfer_from(spender, from, to, amount)
        }

        fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> bool {
            let ok = self.inner.transfer(from, to, amount);
            if *to == self.attacker {
                if let Some(pool) = self.pool.get().and_then(Weak::upgrade) {
                    let result = pool.withdraw_liquidity(self.attacker, 1).map(|(n, _)| n);
                    self.reentry_results.lock().push(result);
                }
            }
            ok
        }
    }

    #[test]
    fn test_reentrant_call_is_rejected() {
        let pool_addr = addr("pool");
        let attacker = addr("attacker");
        let handle = Arc::new(OnceLock::new());
        let results = Arc::new(Mutex::new(Vec::new()));

        let mut native = InMemoryLedger::native();
        native.mint(attacker, 1_000);
        let mut token = InMemoryLedger::token();
        token.mint(attacker, 1_000);
        token.approve(attacker, pool_addr, u128::MAX);

        let hostile = HostileLedger {
            inner: native,
            attacker,
            pool: handle.clone(),
            reentry_results: results.clone(),
        };
        let shared = Arc::new(SharedPool::new(Pool::new(pool_addr, hostile, token)));
        handle.set(Arc::downgrade(&shared)).ok();

        shared.initialize(attacker, 400, 200).unwrap();
        let (native_out, token_out) = shared.withdraw_liquidity(attacker, 100).unwrap();

        assert_eq!((native_out, token_out), (100, 200));
        assert_eq!(*results.lock(), vec![Err(PoolError::Reentrancy)]);
        assert_eq!(shared.share_of(&attacker).unwrap(), 100);
        assert_eq!(shared.total_shares().unwrap(), 100);
    }

    #[test]
    fn test_concurrent_swaps_serialize() {
        let pool_addr = addr("pool");
        let traders: Vec<Address> = (0..8).map(|i| addr(&format!("trader{}", i))).collect();

        let mut native = InMemoryLedger::native();
        let mut token = InMemoryLedger::token();
        native.mint(addr("lp"), 1_000_000);
        token.mint(addr("lp"), 1_000_000);
        token.approve(addr("lp"), pool_addr, u128::MAX);
        for trader in &traders {
            native.mint(*trader, 10_000);
        }

        let shared = Arc::new(SharedPool::new(Pool::new(pool_addr, native, token)));
        shared.initialize(addr("lp"), 1_000_000, 1_000_000).unwrap();

        let handles: Vec<_> = traders
            .iter()
            .map(|trader| {
                let shared = shared.clone();
                let trader = *trader;
                thread::spawn(move || {
                    (0..10)
                        .map(|_| shared.swap_a_to_b(trader, 100).unwrap())
                        .sum::<u128>()
                })
            })
            .collect();
        let paid: u128 = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let reserves = shared.reserves().unwrap();
        assert_eq!(reserves.native, 1_000_000 + 8 * 10 * 100);
        assert_eq!(reserves.token, 1_000_000 - paid);
        assert_eq!(shared.take_events().unwrap().len(), 1 + 80);
        shared.read(|pool| pool.check_invariants()).unwrap().unwrap();
    }
}
