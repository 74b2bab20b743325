//! Account types for fishbowl.
//!
//! An account is owned by the identity subsystem; the feed core only reads
//! the balance and conditionally decrements it. The daily-reward marker
//! shares the same record.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Fish coins spent per feed. Bulk feeding is not supported.
pub const FEED_COST: i64 = 1;

/// Fish coins granted by the once-per-day reward claim.
pub const DAILY_REWARD_FISH: i64 = 10;

/// A user account.
///
/// Tracks the fish-coin balance and the daily-reward claim marker. The
/// nickname is the display name carried in notification events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The user ID (from the identity subsystem).
    pub user_id: UserId,

    /// Login name, unique across the platform.
    pub username: String,

    /// Display name shown to other users.
    pub nickname: String,

    /// Current fish-coin balance. Never negative.
    pub fish_balance: i64,

    /// The calendar day of the last daily-reward claim, if any.
    pub last_daily_claim: Option<NaiveDate>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, nickname: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            username: username.into(),
            nickname: nickname.into(),
            fish_balance: 0,
            last_daily_claim: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can cover a spend of `amount` fish.
    #[must_use]
    pub fn has_sufficient_fish(&self, amount: i64) -> bool {
        self.fish_balance >= amount
    }

    /// Check if the daily reward is claimable on the given day.
    #[must_use]
    pub fn can_claim_daily(&self, today: NaiveDate) -> bool {
        self.last_daily_claim != Some(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balance() {
        let account = Account::new(UserId::generate(), "carp", "Carp");
        assert_eq!(account.fish_balance, 0);
        assert!(account.last_daily_claim.is_none());
    }

    #[test]
    fn sufficient_fish() {
        let mut account = Account::new(UserId::generate(), "carp", "Carp");
        account.fish_balance = 1;

        assert!(account.has_sufficient_fish(1));
        assert!(!account.has_sufficient_fish(2));
    }

    #[test]
    fn daily_claim_once_per_day() {
        let mut account = Account::new(UserId::generate(), "carp", "Carp");
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        assert!(account.can_claim_daily(today));

        account.last_daily_claim = Some(today);
        assert!(!account.can_claim_daily(today));
        assert!(account.can_claim_daily(today.succ_opt().unwrap()));
    }
}
