//! Core Nostr protocol data types.
//!
//! This crate carries just the event structure and its accessors, for use by
//! relay-side components (filter matching, storage) that never sign or
//! verify events themselves.

mod event;

pub use event::Event;
