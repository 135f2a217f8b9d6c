//! Keyword-based intent classification.
//!
//! Matching is plain substring search over the lowercased query. Keywords
//! are checked in order and regulatory terms win over organization terms.
//! Substring matching is intentionally loose: `"translate"` contains
//! `"sla"` and `"particle "` contains `"article "`.

use crate::types::Intent;

/// Terms that route a query to the regulatory collection.
pub const REGULATORY_KEYWORDS: [&str; 4] = [" nec ", "national electrical code", "nfpa 70", "article "];

/// Terms that route a query to the organization collection.
pub const ORGANIZATION_KEYWORDS: [&str; 6] = ["wattmonk", "policy", "sla", "pricing", "services", "turnaround"];

/// Classify a query into an [`Intent`].
pub fn classify(query: &str) -> Intent {
    let q = query.to_lowercase();

    if REGULATORY_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Intent::Regulatory;
    }
    if ORGANIZATION_KEYWORDS.iter().any(|k| q.contains(k)) {
        return Intent::Organization;
    }
    Intent::General
}
