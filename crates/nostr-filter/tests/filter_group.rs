//! Integration tests: JSON subscription requests through to match decisions
//!
//! Exercises the whole pipeline the relay server uses: a REQ value arrives,
//! is compiled into a filter group, and events are checked against it.

use nostr_filter::{FilterError, FilterGroup, FilterLimits, Subscription, SubscriptionManager};
use nostr_types::Event;
use serde_json::json;

const ID: &str = "5c83da77af1dec6d7289834998ad7aafbd9e2191396d75ec3cc27f5a77226f36";
const PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
const REF: &str = "d0b2b2e56d4d6a534f5a5b3a77ef4478b3b6d17e2a276b4c7ab1d0d0524efea2";

fn make_event(kind: u16, created_at: u64, tags: Vec<Vec<String>>) -> Event {
    Event {
        id: ID.to_string(),
        pubkey: PUBKEY.to_string(),
        created_at,
        kind,
        tags,
        content: "integration".to_string(),
        sig: String::new(),
    }
}

#[test]
fn test_req_round_trip() {
    let req = json!([
        "REQ",
        "timeline",
        { "authors": [&PUBKEY[..16]], "kinds": [1, 6], "since": 1_700_000_000 },
        { "#e": [REF], "limit": 20 }
    ]);

    let group = FilterGroup::from_req(&req, &FilterLimits::default()).unwrap();
    assert_eq!(group.len(), 2);

    // First filter: author prefix + kind + since.
    assert!(group.matches(&make_event(1, 1_700_000_100, vec![])));
    assert!(!group.matches(&make_event(1, 1_600_000_000, vec![])));
    assert!(!group.matches(&make_event(5, 1_700_000_100, vec![])));

    // Second filter: reference tag, any kind and time.
    let tagged = vec![vec!["e".to_string(), REF.to_string()]];
    assert!(group.matches(&make_event(5, 1_600_000_000, tagged)));
}

#[test]
fn test_scan_hints_exposed_per_filter() {
    let req = json!([
        "REQ",
        "scan",
        { "kinds": [1], "until": 2_000_000_000 },
        { "kinds": [1], "authors": [PUBKEY] }
    ]);

    let group = FilterGroup::from_req(&req, &FilterLimits::default()).unwrap();
    let filters = group.filters();

    assert!(filters[0].index_only_scan());
    assert!(!filters[1].index_only_scan());

    // Sorted matcher contents double as storage probe bounds.
    let authors = filters[1].authors().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors.at(0), hex::decode(PUBKEY).unwrap().as_slice());
    assert_eq!(filters[1].kinds().unwrap().at(0), 1);
}

#[test]
fn test_never_match_filter_survivor_semantics() {
    let req = json!(["REQ", "sub", { "authors": [] }, { "kinds": [1] }]);
    let group = FilterGroup::from_req(&req, &FilterLimits::default()).unwrap();

    assert_eq!(group.len(), 1);
    assert!(group.matches(&make_event(1, 100, vec![])));
    assert!(!group.matches(&make_event(2, 100, vec![])));
}

#[test]
fn test_construction_errors_surface_synchronously() {
    let limits = FilterLimits::default();

    let cases = [
        (json!(["REQ", "s"]), "too short"),
        (json!(["REQ", "s", { "nope": [1] }]), "unknown field"),
        (json!(["REQ", "s", { "#long": ["x"] }]), "unindexed tag"),
        (
            json!(["REQ", "s", { "#e": [REF], "#p": [REF], "#t": ["x"] }]),
            "too many tags",
        ),
        (json!(["REQ", "s", { "ids": ["zz"] }]), "bad hex"),
    ];

    for (req, what) in cases {
        assert!(
            FilterGroup::from_req(&req, &limits).is_err(),
            "expected error for {what}"
        );
    }
}

#[test]
fn test_error_kinds() {
    let limits = FilterLimits::default();

    let err = FilterGroup::from_req(&json!(["REQ", "s", { "#abc": ["x"] }]), &limits).unwrap_err();
    assert!(matches!(err, FilterError::UnindexedTag(_)));

    let err =
        FilterGroup::from_req(&json!(["REQ", "s", { "ids": ["gg"] }]), &limits).unwrap_err();
    assert!(matches!(err, FilterError::InvalidHex(_)));

    let err = FilterGroup::unwrapped(json!({ "whatever": 1 }), &limits).unwrap_err();
    assert!(matches!(err, FilterError::UnrecognizedField(_)));
}

#[test]
fn test_subscription_lifecycle() {
    let limits = FilterLimits::default();
    let mut manager = SubscriptionManager::new();

    let notes = Subscription::from_req(&json!(["REQ", "notes", { "kinds": [1] }]), &limits).unwrap();
    let reactions =
        Subscription::from_req(&json!(["REQ", "reactions", { "kinds": [7] }]), &limits).unwrap();

    manager.add(notes);
    manager.add(reactions);
    assert_eq!(manager.len(), 2);

    let mut matching = manager.matches_any(&make_event(1, 100, vec![]));
    matching.sort();
    assert_eq!(matching, vec!["notes".to_string()]);

    assert!(manager.remove("notes"));
    assert!(manager.matches_any(&make_event(1, 100, vec![])).is_empty());

    manager.clear();
    assert!(manager.is_empty());
}

#[test]
fn test_group_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FilterGroup>();
    assert_send_sync::<Subscription>();
    assert_send_sync::<SubscriptionManager>();
}

#[test]
fn test_concurrent_matching() {
    let req = json!(["REQ", "shared", { "kinds": [1] }, { "#t": ["nostr"] }]);
    let group =
        std::sync::Arc::new(FilterGroup::from_req(&req, &FilterLimits::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let group = std::sync::Arc::clone(&group);
            std::thread::spawn(move || {
                let event = make_event(1, 100 + n, vec![]);
                assert!(group.matches(&event));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
