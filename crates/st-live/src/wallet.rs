//! Simulated wallet

use serde::{Deserialize, Serialize};

use st_sim::BatchSummary;

/// Simulated player balance plus lifetime totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    balance: f64,
    total_staked: f64,
    total_won: f64,
}

impl Wallet {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            total_staked: 0.0,
            total_won: 0.0,
        }
    }

    /// Settle one tick's aggregated totals in a single step
    pub fn settle(&mut self, totals: &BatchSummary) {
        self.balance = self.balance - totals.total_stake + totals.total_win;
        self.total_staked += totals.total_stake;
        self.total_won += totals.total_win;
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn total_staked(&self) -> f64 {
        self.total_staked
    }

    pub fn total_won(&self) -> f64 {
        self.total_won
    }

    /// Won minus staked since the wallet was created
    pub fn net_position(&self) -> f64 {
        self.total_won - self.total_staked
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle() {
        let mut wallet = Wallet::new(100.0);
        wallet.settle(&BatchSummary {
            spins: 10,
            hits: 2,
            total_stake: 10.0,
            total_win: 4.5,
            max_multiplier: 3.0,
        });
        assert_eq!(wallet.balance(), 94.5);
        assert_eq!(wallet.total_staked(), 10.0);
        assert_eq!(wallet.net_position(), -5.5);
    }

    #[test]
    fn test_empty_settle_is_noop() {
        let mut wallet = Wallet::default();
        wallet.settle(&BatchSummary::default());
        assert_eq!(wallet, Wallet::new(10_000.0));
    }
}
