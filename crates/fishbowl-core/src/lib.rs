//! Core types and utilities for fishbowl.
//!
//! This crate provides the foundational types used throughout the fishbowl
//! platform:
//!
//! - **Identifiers**: `UserId`, `VideoId`, `EntryId`, `NotificationId`
//! - **Accounts**: `Account` and the fish-coin constants
//! - **Videos**: `Video`, `VideoDetail`
//! - **Ledger**: `FeedLedgerEntry`
//! - **Notifications**: `NotificationEvent`, `Notification`, `NotificationKind`
//!
//! # Fish coins
//!
//! Fish coins are the scarce per-account currency spent to endorse videos.
//! One feed costs exactly one fish; the daily reward grants ten. Balances are
//! stored as `i64` and are never negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod notification;
pub mod video;

pub use account::{Account, DAILY_REWARD_FISH, FEED_COST};
pub use error::{FeedError, Result};
pub use ids::{EntryId, IdError, NotificationId, UserId, VideoId};
pub use ledger::FeedLedgerEntry;
pub use notification::{Notification, NotificationEvent, NotificationKind};
pub use video::{Video, VideoDetail};
