//! Subscription-filter matching engine for a Nostr relay
//!
//! This crate compiles protocol-level filter values into immutable matchers
//! and decides, per event, whether a subscription wants it:
//! - [`PrefixSet`]: compacted, sorted byte-string sets with prefix matching
//! - [`UintSet`]: sorted integer sets with exact matching
//! - [`Filter`]: one filter object (ids, authors, kinds, tag filters, time
//!   window, limit) with a never-match / index-only-scan classification
//! - [`FilterGroup`]: the OR of one subscription request's filters
//! - [`Subscription`] / [`SubscriptionManager`]: per-connection bookkeeping
//!
//! Construction is the only mutation path and surfaces every validation
//! failure before a filter is observable. A compiled group is immutable and
//! can be shared across worker threads and matched concurrently without
//! synchronization.

mod error;
mod filter;
mod prefix_set;
mod subscription;
mod uint_set;


pub use error::{FilterError, Result};
pub use filter::{Filter, FilterLimits};
pub use prefix_set::PrefixSet;
pub use subscription::{FilterGroup, Subscription, SubscriptionManager};
pub use uint_set::UintSet;
