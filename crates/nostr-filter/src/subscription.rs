//! Subscription requests: filter groups and per-connection bookkeeping
//!
//! A `FilterGroup` is the compiled form of one REQ request — the OR of its
//! filters. `Subscription` pairs a group with its id, and
//! `SubscriptionManager` tracks the live subscriptions of one connection.
//! Everything here is in-memory bookkeeping; transport and session lifetimes
//! belong to the server layer.

use crate::error::{FilterError, Result};
use crate::filter::{Filter, FilterLimits};
use nostr_types::Event;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::debug;

/// OR-combination of the filters from one subscription request.
#[derive(Debug, Clone)]
pub struct FilterGroup {
    filters: Vec<Filter>,
}

impl FilterGroup {
    /// Compile a full `["REQ", subscription_id, filter, ...]` request.
    ///
    /// Filters that can never match are dropped up front: removing an
    /// always-false branch leaves the OR unchanged and saves per-event work.
    /// Any invalid filter aborts the whole request.
    pub fn from_req(req: &Value, limits: &FilterLimits) -> Result<Self> {
        let arr = req
            .as_array()
            .ok_or(FilterError::MalformedRequest("expected array"))?;
        if arr.len() < 3 {
            return Err(FilterError::MalformedRequest("missing filters"));
        }

        let mut filters = Vec::with_capacity(arr.len() - 2);
        for value in &arr[2..] {
            let filter = Filter::from_json(value, limits)?;
            if filter.never_match() {
                continue;
            }
            filters.push(filter);
        }

        debug!(
            requested = arr.len() - 2,
            compiled = filters.len(),
            "compiled filter group"
        );

        Ok(Self { filters })
    }

    /// Compile a bare filter object, or a bare array of filter objects, not
    /// wrapped in a request envelope.
    ///
    /// Convenience path for ad-hoc evaluation outside a live subscription;
    /// synthesizes a placeholder envelope and delegates to [`Self::from_req`].
    pub fn unwrapped(filter: Value, limits: &FilterLimits) -> Result<Self> {
        let filters = match filter {
            Value::Array(filters) => filters,
            other => vec![other],
        };

        let mut req = vec![json!("REQ"), json!("adhoc")];
        req.extend(filters);

        Self::from_req(&Value::Array(req), limits)
    }

    /// Check whether any filter in the group matches; short-circuits on the
    /// first success.
    pub fn matches(&self, event: &Event) -> bool {
        self.filters.iter().any(|filter| filter.matches(event))
    }

    /// The stored filters, for the storage layer's scan planning.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Number of stored filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether no filters survived compilation. An empty group matches
    /// nothing.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// A client subscription: id plus compiled filter group.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Subscription id, chosen by the client
    pub id: String,
    /// Compiled filters for this subscription
    pub group: FilterGroup,
}

impl Subscription {
    /// Create a subscription from an already compiled group.
    pub fn new(id: impl Into<String>, group: FilterGroup) -> Self {
        Self {
            id: id.into(),
            group,
        }
    }

    /// Compile a subscription straight from a REQ request, taking the id
    /// from the envelope.
    pub fn from_req(req: &Value, limits: &FilterLimits) -> Result<Self> {
        let id = req
            .as_array()
            .and_then(|arr| arr.get(1))
            .and_then(Value::as_str)
            .ok_or(FilterError::MalformedRequest("missing subscription id"))?;

        Ok(Self::new(id, FilterGroup::from_req(req, limits)?))
    }

    /// Check whether an event matches any filter in this subscription.
    pub fn matches(&self, event: &Event) -> bool {
        self.group.matches(event)
    }
}

/// Live subscriptions for one connection.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionManager {
    subscriptions: HashMap<String, Subscription>,
}

impl SubscriptionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription, replacing any existing one with the same id.
    pub fn add(&mut self, subscription: Subscription) {
        debug!(
            subscription_id = %subscription.id,
            filters = subscription.group.len(),
            "subscription added"
        );
        self.subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Remove a subscription; returns whether it existed.
    pub fn remove(&mut self, subscription_id: &str) -> bool {
        let removed = self.subscriptions.remove(subscription_id).is_some();
        if removed {
            debug!(subscription_id, "subscription removed");
        }
        removed
    }

    /// Get a subscription by id.
    pub fn get(&self, subscription_id: &str) -> Option<&Subscription> {
        self.subscriptions.get(subscription_id)
    }

    /// Ids of every subscription the event matches.
    pub fn matches_any(&self, event: &Event) -> Vec<String> {
        self.subscriptions
            .values()
            .filter(|sub| sub.matches(event))
            .map(|sub| sub.id.clone())
            .collect()
    }

    /// All live subscription ids.
    pub fn subscription_ids(&self) -> Vec<String> {
        self.subscriptions.keys().cloned().collect()
    }

    /// Drop every subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether there are no live subscriptions.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
