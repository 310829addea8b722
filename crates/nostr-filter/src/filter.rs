//! Subscription filter compilation and matching
//!
//! A `Filter` is compiled once from a protocol-level JSON object into
//! immutable matchers, then evaluated per event. All constraints are
//! AND-combined; within one set field, members are alternatives. The
//! `index_only_scan` classification tells the storage layer whether a filter
//! can be decided from indexed metadata alone or needs the full record.

use crate::error::{FilterError, Result};
use crate::prefix_set::PrefixSet;
use crate::uint_set::UintSet;
use nostr_types::Event;
use serde_json::Value;

/// Externally supplied construction limits.
///
/// Threaded explicitly into every construction call so the engine stays pure
/// and testable; never read from ambient state.
#[derive(Debug, Clone)]
pub struct FilterLimits {
    /// Maximum byte length for non-reference tag filter values
    pub max_tag_value_size: usize,
    /// Ceiling applied to a filter's requested `limit`
    pub max_filter_limit: u64,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_tag_value_size: 255,
            max_filter_limit: 500,
        }
    }
}

/// Reference tags carry 32-byte hex-encoded event ids or pubkeys.
fn is_reference_tag(letter: char) -> bool {
    letter == 'e' || letter == 'p'
}

fn invalid(field: &str, expected: &'static str) -> FilterError {
    FilterError::InvalidFieldType {
        field: field.to_string(),
        expected,
    }
}

fn string_array<'a>(field: &str, value: &'a Value) -> Result<Vec<&'a str>> {
    let arr = value
        .as_array()
        .ok_or_else(|| invalid(field, "array of strings"))?;
    arr.iter()
        .map(|v| v.as_str().ok_or_else(|| invalid(field, "array of strings")))
        .collect()
}

fn uint_array(field: &str, value: &Value) -> Result<Vec<u64>> {
    let arr = value
        .as_array()
        .ok_or_else(|| invalid(field, "array of unsigned integers"))?;
    arr.iter()
        .map(|v| {
            v.as_u64()
                .ok_or_else(|| invalid(field, "array of unsigned integers"))
        })
        .collect()
}

fn uint_value(field: &str, value: &Value) -> Result<u64> {
    value.as_u64().ok_or_else(|| invalid(field, "unsigned integer"))
}

/// One compiled subscription filter.
///
/// Immutable after construction; matching is pure and safe to run
/// concurrently.
#[derive(Debug, Clone)]
pub struct Filter {
    ids: Option<PrefixSet>,
    authors: Option<PrefixSet>,
    kinds: Option<UintSet>,
    tags: Vec<(char, PrefixSet)>,
    since: u64,
    until: u64,
    limit: u64,
    never_match: bool,
    index_only_scan: bool,
}

impl Filter {
    /// Per-event matching cost is tag-filter-count x event-tag-count, so the
    /// number of tag filters is bounded.
    pub const MAX_TAG_FILTERS: usize = 2;

    /// Compile a filter from its protocol JSON object.
    ///
    /// Recognized keys: `ids`, `authors`, `kinds`, `#X` (one letter),
    /// `since`, `until`, `limit`. Anything else is rejected.
    pub fn from_json(value: &Value, limits: &FilterLimits) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| invalid("filter", "object"))?;

        let mut filter = Self {
            ids: None,
            authors: None,
            kinds: None,
            tags: Vec::new(),
            since: 0,
            until: u64::MAX,
            limit: u64::MAX,
            never_match: false,
            index_only_scan: true,
        };
        let mut major_fields = 0usize;

        for (key, v) in obj {
            // An empty candidate set can never match, which makes the whole
            // filter vacuously false; remaining fields are irrelevant.
            if v.as_array().is_some_and(Vec::is_empty) {
                filter.never_match = true;
                break;
            }

            match key.as_str() {
                "ids" => {
                    filter.ids = Some(PrefixSet::new(string_array(key, v)?, true, 1, 32)?);
                    major_fields += 1;
                }
                "authors" => {
                    filter.authors = Some(PrefixSet::new(string_array(key, v)?, true, 1, 32)?);
                    major_fields += 1;
                }
                "kinds" => {
                    filter.kinds = Some(UintSet::new(uint_array(key, v)?));
                    major_fields += 1;
                }
                "since" => filter.since = uint_value(key, v)?,
                "until" => filter.until = uint_value(key, v)?,
                "limit" => filter.limit = uint_value(key, v)?,
                _ if key.starts_with('#') => {
                    major_fields += 1;

                    let mut letters = key.chars().skip(1);
                    match (letters.next(), letters.next()) {
                        (Some(letter), None) => {
                            let set = if is_reference_tag(letter) {
                                PrefixSet::new(string_array(key, v)?, true, 32, 32)?
                            } else {
                                PrefixSet::new(
                                    string_array(key, v)?,
                                    false,
                                    1,
                                    limits.max_tag_value_size,
                                )?
                            };
                            filter.tags.push((letter, set));
                        }
                        // No index is maintained for free-form tag keys.
                        _ => return Err(FilterError::UnindexedTag(key.clone())),
                    }
                }
                _ => return Err(FilterError::UnrecognizedField(key.clone())),
            }
        }

        if filter.tags.len() > Self::MAX_TAG_FILTERS {
            return Err(FilterError::TooManyTagFilters {
                count: filter.tags.len(),
            });
        }

        filter.limit = filter.limit.min(limits.max_filter_limit);

        // Time bounds plus at most one selective field can be serviced from
        // indexed metadata without fetching the full record.
        filter.index_only_scan = major_fields <= 1;

        Ok(filter)
    }

    /// Inclusive time-window check.
    pub fn matches_times(&self, created_at: u64) -> bool {
        created_at >= self.since && created_at <= self.until
    }

    /// Check whether an event satisfies every constraint in this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if self.never_match {
            return false;
        }

        if !self.matches_times(event.created_at) {
            return false;
        }

        if let Some(ids) = &self.ids
            && !matches_hex(ids, &event.id)
        {
            return false;
        }

        if let Some(authors) = &self.authors
            && !matches_hex(authors, &event.pubkey)
        {
            return false;
        }

        if let Some(kinds) = &self.kinds
            && !kinds.matches(u64::from(event.kind))
        {
            return false;
        }

        // OR across the event's repeated tags of one letter, AND across the
        // configured letters.
        for (letter, set) in &self.tags {
            let found = event.tag_entries().any(|(name, value)| {
                single_letter(name) == Some(*letter) && matches_tag_value(*letter, set, value)
            });

            if !found {
                return false;
            }
        }

        true
    }

    /// Id prefix matcher, when the filter constrains ids.
    pub fn ids(&self) -> Option<&PrefixSet> {
        self.ids.as_ref()
    }

    /// Author prefix matcher, when the filter constrains authors.
    pub fn authors(&self) -> Option<&PrefixSet> {
        self.authors.as_ref()
    }

    /// Kind matcher, when the filter constrains kinds.
    pub fn kinds(&self) -> Option<&UintSet> {
        self.kinds.as_ref()
    }

    /// Configured tag filters as (letter, matcher) pairs.
    pub fn tags(&self) -> &[(char, PrefixSet)] {
        &self.tags
    }

    /// Lower time bound (inclusive), 0 when unset.
    pub fn since(&self) -> u64 {
        self.since
    }

    /// Upper time bound (inclusive), `u64::MAX` when unset.
    pub fn until(&self) -> u64 {
        self.until
    }

    /// Result-count limit, already clamped to the configured ceiling.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Whether this filter can never match any event.
    pub fn never_match(&self) -> bool {
        self.never_match
    }

    /// Whether the storage layer can decide this filter from indexed
    /// metadata alone.
    pub fn index_only_scan(&self) -> bool {
        self.index_only_scan
    }
}

fn single_letter(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn matches_hex(set: &PrefixSet, value: &str) -> bool {
    match hex::decode(value) {
        Ok(bytes) if !bytes.is_empty() => set.matches(&bytes).unwrap_or(false),
        _ => false,
    }
}

fn matches_tag_value(letter: char, set: &PrefixSet, value: &str) -> bool {
    if is_reference_tag(letter) {
        matches_hex(set, value)
    } else {
        !value.is_empty() && set.matches(value.as_bytes()).unwrap_or(false)
    }
}
