//! Standardized expense categories and the frozen lookup from the free-text
//! categories used in the expense detail sheets.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum StandardCategory {
    Administrative,
    DiningAndFood,
    EducationAndDevelopment,
    FamilyAndChildcare,
    FinancialServices,
    Healthcare,
    HomeAndUtilities,
    Housing,
    InsuranceAndProtection,
    PersonalCareAndClothing,
    PetCare,
    RecreationAndEntertainment,
    SubscriptionsAndMemberships,
    Transportation,
    Travel,
    /// Fallback for any raw category not present in the map.
    Other,
}

impl StandardCategory {
    /// The fifteen mapped categories, alphabetical by label. `Other` is not included.
    pub const MAPPED: [StandardCategory; 15] = [
        StandardCategory::Administrative,
        StandardCategory::DiningAndFood,
        StandardCategory::EducationAndDevelopment,
        StandardCategory::FamilyAndChildcare,
        StandardCategory::FinancialServices,
        StandardCategory::Healthcare,
        StandardCategory::HomeAndUtilities,
        StandardCategory::Housing,
        StandardCategory::InsuranceAndProtection,
        StandardCategory::PersonalCareAndClothing,
        StandardCategory::PetCare,
        StandardCategory::RecreationAndEntertainment,
        StandardCategory::SubscriptionsAndMemberships,
        StandardCategory::Transportation,
        StandardCategory::Travel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StandardCategory::Administrative => "Administrative",
            StandardCategory::DiningAndFood => "Dining & Food",
            StandardCategory::EducationAndDevelopment => "Education & Development",
            StandardCategory::FamilyAndChildcare => "Family & Childcare",
            StandardCategory::FinancialServices => "Financial Services",
            StandardCategory::Healthcare => "Healthcare",
            StandardCategory::HomeAndUtilities => "Home & Utilities",
            StandardCategory::Housing => "Housing",
            StandardCategory::InsuranceAndProtection => "Insurance & Protection",
            StandardCategory::PersonalCareAndClothing => "Personal Care & Clothing",
            StandardCategory::PetCare => "Pet Care",
            StandardCategory::RecreationAndEntertainment => "Recreation & Entertainment",
            StandardCategory::SubscriptionsAndMemberships => "Subscriptions & Memberships",
            StandardCategory::Transportation => "Transportation",
            StandardCategory::Travel => "Travel",
            StandardCategory::Other => "Other",
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, StandardCategory::Other)
    }
}

impl fmt::Display for StandardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lowercase raw category -> standardized category. Personal sheet entries
/// first, then the shared sheet entries.
const CATEGORY_MAP: &[(&str, StandardCategory)] = &[
    ("books", StandardCategory::EducationAndDevelopment),
    ("admin", StandardCategory::Administrative),
    ("career", StandardCategory::EducationAndDevelopment),
    ("clothing", StandardCategory::PersonalCareAndClothing),
    ("digital subscriptions", StandardCategory::SubscriptionsAndMemberships),
    ("education", StandardCategory::EducationAndDevelopment),
    ("finance", StandardCategory::FinancialServices),
    ("golf", StandardCategory::RecreationAndEntertainment),
    ("grooming", StandardCategory::PersonalCareAndClothing),
    ("health", StandardCategory::Healthcare),
    ("hobbies", StandardCategory::RecreationAndEntertainment),
    ("personal", StandardCategory::PersonalCareAndClothing),
    ("restaurants", StandardCategory::DiningAndFood),
    ("transportation", StandardCategory::Transportation),
    ("therapy", StandardCategory::Healthcare),
    ("amelia", StandardCategory::PetCare),
    ("baby", StandardCategory::FamilyAndChildcare),
    ("car", StandardCategory::Transportation),
    ("going out", StandardCategory::RecreationAndEntertainment),
    ("groceries", StandardCategory::DiningAndFood),
    ("home", StandardCategory::HomeAndUtilities),
    ("household goods", StandardCategory::HomeAndUtilities),
    ("rent or mortgage", StandardCategory::Housing),
    ("travel", StandardCategory::Travel),
    ("utilities", StandardCategory::HomeAndUtilities),
    ("insurance", StandardCategory::InsuranceAndProtection),
];

/// Raw category keys known to the normalizer, in map order.
pub fn mapped_keys() -> impl Iterator<Item = &'static str> {
    CATEGORY_MAP.iter().map(|(key, _)| *key)
}

/// Resolves a raw category (any case, surrounding whitespace ignored).
/// Missing, empty, and unknown inputs all resolve to `Other`.
pub fn normalize(raw_category: Option<&str>) -> StandardCategory {
    let key = match raw_category.map(|raw| raw.trim().to_lowercase()) {
        Some(key) if !key.is_empty() => key,
        _ => return StandardCategory::Other,
    };

    CATEGORY_MAP
        .iter()
        .find(|(raw, _)| *raw == key)
        .map(|(_, category)| *category)
        .unwrap_or(StandardCategory::Other)
}

/// Counts raw categories that fell through to `Other`, keyed by the
/// lowercased raw text, so drift in the source vocabulary is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmappedTally {
    pub counts: BTreeMap<String, usize>,
}

impl UnmappedTally {
    pub fn record(&mut self, raw_category: Option<&str>) {
        let key = raw_category
            .map(|raw| raw.trim().to_lowercase())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| "(blank)".to_string());
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_every_key_normalizes_regardless_of_case() {
        let keys: Vec<&str> = mapped_keys().collect();
        assert_eq!(keys.len(), CATEGORY_MAP.len());

        for key in keys {
            let expected = normalize(Some(key));
            assert_ne!(expected, StandardCategory::Other, "{} is unmapped", key);
            assert_eq!(normalize(Some(&key.to_uppercase())), expected);
            assert_eq!(normalize(Some(&format!("  {}  ", key))), expected);
        }
    }

    #[test]
    fn test_mapped_keys_are_stored_normalized() {
        let mut seen = BTreeSet::new();
        for key in mapped_keys() {
            assert_eq!(key, key.trim().to_lowercase(), "{} is not normalized", key);
            assert!(seen.insert(key), "{} is mapped twice", key);
        }
    }

    #[test]
    fn test_unknown_and_missing_are_other() {
        assert_eq!(normalize(Some("crypto")), StandardCategory::Other);
        assert_eq!(normalize(Some("")), StandardCategory::Other);
        assert_eq!(normalize(Some("   ")), StandardCategory::Other);
        assert_eq!(normalize(None), StandardCategory::Other);
        assert_eq!(normalize(Some("nan")), StandardCategory::Other);
    }

    #[test]
    fn test_map_targets_exactly_fifteen_categories() {
        let targets: BTreeSet<StandardCategory> =
            CATEGORY_MAP.iter().map(|(_, category)| *category).collect();
        assert_eq!(targets.len(), 15);
        assert!(!targets.contains(&StandardCategory::Other));

        let mapped: BTreeSet<StandardCategory> = StandardCategory::MAPPED.into_iter().collect();
        assert_eq!(targets, mapped);
    }

    #[test]
    fn test_mapped_is_sorted_by_label() {
        let labels: Vec<&str> = StandardCategory::MAPPED.iter().map(|c| c.label()).collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn test_groceries_maps_to_dining() {
        assert_eq!(normalize(Some("Groceries")).label(), "Dining & Food");
        assert_eq!(normalize(Some("rent or mortgage")).label(), "Housing");
    }

    #[test]
    fn test_unmapped_tally() {
        let mut tally = UnmappedTally::default();
        tally.record(Some("Crypto"));
        tally.record(Some("crypto "));
        tally.record(None);

        assert_eq!(tally.total(), 3);
        assert_eq!(tally.counts.get("crypto"), Some(&2));
        assert_eq!(tally.counts.get("(blank)"), Some(&1));
    }
}
