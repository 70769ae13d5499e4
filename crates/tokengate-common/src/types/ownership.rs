//! Ownership query result

use primitive_types::U256;

/// Number of asset units an account holds, as reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipResult {
    owned_unit_count: U256,
}

impl OwnershipResult {
    pub fn new(owned_unit_count: U256) -> Self {
        Self { owned_unit_count }
    }

    /// Raw balance
    pub fn owned_unit_count(&self) -> U256 {
        self.owned_unit_count
    }

    /// Ownership means at least one unit
    pub fn is_owner(&self) -> bool {
        !self.owned_unit_count.is_zero()
    }
}

impl From<u64> for OwnershipResult {
    fn from(count: u64) -> Self {
        Self::new(U256::from(count))
    }
}
