//! Asset ledger interface and in-memory implementation
//!
//! The pool never stores reserves itself. Both the native asset and the token
//! live in external ledgers; the pool reads its own balances from them and
//! instructs them to move funds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Full 20-byte account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Deterministic address from a short label, right-aligned and truncated to 20 bytes.
    pub fn from_label(label: &str) -> Self {
        let bytes = label.as_bytes();
        let take = bytes.len().min(20);
        let mut out = [0u8; 20];
        out[20 - take..].copy_from_slice(&bytes[..take]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut out)?;
        Ok(Self(out))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The two reserve assets held by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Asset A, the native value asset
    Native,
    /// Asset B, the fungible token
    Token,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("Native"),
            Asset::Token => f.write_str("Token"),
        }
    }
}

/// Balance ledger for a single asset
///
/// Transfers report success as a plain `bool`; the pool turns a rejection
/// into [`crate::PoolError::TransferFailed`].
pub trait AssetLedger {
    /// Current balance held by `owner`
    fn balance_of(&self, owner: &Address) -> u128;

    /// Move `amount` from `from` to `to` on behalf of `spender`.
    ///
    /// For a token this consumes allowance previously granted by `from`. For the
    /// native asset it models value attached to the call.
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> bool;

    /// Push `amount` from `from` to `to`; fails if the recipient rejects it
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> bool;
}

/// HashMap-backed ledger used by tests and the simulator
#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    asset: Asset,
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    rejecting: HashSet<Address>,
}

impl InMemoryLedger {
    /// Native ledger: attaching value needs no prior approval
    pub fn native() -> Self {
        Self::new(Asset::Native)
    }

    /// Token ledger: `transfer_from` consumes allowance
    pub fn token() -> Self {
        Self::new(Asset::Token)
    }

    fn new(asset: Asset) -> Self {
        Self {
            asset,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            rejecting: HashSet::new(),
        }
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    /// Credit `amount` out of thin air
    pub fn mint(&mut self, owner: Address, amount: u128) {
        let balance = self.balances.entry(owner).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Make every incoming push to `recipient` fail
    pub fn reject_incoming(&mut self, recipient: Address) {
        self.rejecting.insert(recipient);
    }

    pub fn accept_incoming(&mut self, recipient: &Address) {
        self.rejecting.remove(recipient);
    }

    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> bool {
        if self.rejecting.contains(to) {
            debug!(asset = %self.asset, recipient = %to, amount, "Recipient rejected transfer");
            return false;
        }
        let available = self.balance_of(from);
        if available < amount {
            debug!(asset = %self.asset, owner = %from, available, amount, "Insufficient balance");
            return false;
        }
        if from == to {
            return true;
        }
        let Some(credited) = self.balance_of(to).checked_add(amount) else {
            return false;
        };
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        true
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> bool {
        if self.asset == Asset::Native {
            return self.move_balance(from, to, amount);
        }

        let allowance = self.allowance(from, spender);
        if allowance < amount {
            debug!(owner = %from, spender = %spender, allowance, amount, "Insufficient allowance");
            return false;
        }
        if !self.move_balance(from, to, amount) {
            return false;
        }
        self.allowances.insert((*from, *spender), allowance - amount);
        true
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> bool {
        self.move_balance(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_roundtrip() {
        let addr = Address::from_label("alice");
        let text = addr.to_string();
        assert!(text.starts_with("0x"));
        assert!(text.ends_with(&hex::encode("alice")));
        assert_eq!(text.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn test_token_transfer_from_requires_allowance() {
        let owner = Address::from_label("owner");
        let pool = Address::from_label("pool");
        let mut ledger = InMemoryLedger::token();
        ledger.mint(owner, 100);

        assert!(!ledger.transfer_from(&pool, &owner, &pool, 50));

        ledger.approve(owner, pool, 60);
        assert!(ledger.transfer_from(&pool, &owner, &pool, 50));
        assert_eq!(ledger.balance_of(&pool), 50);
        assert_eq!(ledger.allowance(&owner, &pool), 10);
    }

    #[test]
    fn test_native_attach_needs_no_allowance() {
        let owner = Address::from_label("owner");
        let pool = Address::from_label("pool");
        let mut ledger = InMemoryLedger::native();
        ledger.mint(owner, 100);

        assert!(ledger.transfer_from(&pool, &owner, &pool, 100));
        assert!(!ledger.transfer_from(&pool, &owner, &pool, 1));
        assert_eq!(ledger.balance_of(&pool), 100);
    }

    #[test]
    fn test_rejecting_recipient() {
        let pool = Address::from_label("pool");
        let sink = Address::from_label("sink");
        let mut ledger = InMemoryLedger::native();
        ledger.mint(pool, 10);
        ledger.reject_incoming(sink);

        assert!(!ledger.transfer(&pool, &sink, 5));
        assert_eq!(ledger.balance_of(&pool), 10);

        ledger.accept_incoming(&sink);
        assert!(ledger.transfer(&pool, &sink, 5));
        assert_eq!(ledger.balance_of(&sink), 5);
    }
}
