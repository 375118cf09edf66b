//! Per-connection subscription filter

use std::collections::HashSet;

/// Which searches a connection wants detection events for.
///
/// Alerts ignore this entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Subscription {
    /// Every detection, whatever search it belongs to
    #[default]
    AllSearches,
    /// Only detections whose search id is in the set
    OnlySearches(HashSet<String>),
}

impl Subscription {
    /// Build a filter from the `searchIds` list of a `subscribe` message.
    ///
    /// An empty list means "all searches", not "nothing".
    pub fn from_search_ids(search_ids: Vec<String>) -> Self {
        if search_ids.is_empty() {
            Subscription::AllSearches
        } else {
            Subscription::OnlySearches(search_ids.into_iter().collect())
        }
    }

    /// Whether a detection for `search_id` passes this filter
    pub fn matches(&self, search_id: &str) -> bool {
        match self {
            Subscription::AllSearches => true,
            Subscription::OnlySearches(ids) => ids.contains(search_id),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Subscription::AllSearches)
    }
}
