// Sidebar filter selections
// A record passes when its branch, city, customer type and gender are each selected.
// An empty set selects nothing; it is not "no filter".

use crate::dataset::{Dataset, FilterOptions};
use crate::dimension::Dimension;
use crate::record::SalesRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Filtered view over the dataset. Records are borrowed, never copied or mutated.
pub type Subset<'a> = Vec<&'a SalesRecord>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub branches: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub customer_types: BTreeSet<String>,
    pub genders: BTreeSet<String>,
}

impl FilterSelection {
    /// Every known value selected (the sidebar default)
    pub fn all(dataset: &Dataset) -> Self {
        Self::from_options(dataset.options())
    }

    pub fn from_options(options: &FilterOptions) -> Self {
        FilterSelection {
            branches: options.branches.iter().cloned().collect(),
            cities: options.cities.iter().cloned().collect(),
            customer_types: options.customer_types.iter().cloned().collect(),
            genders: options.genders.iter().cloned().collect(),
        }
    }

    /// Nothing selected in any dimension
    pub fn none() -> Self {
        Self::default()
    }

    /// The selection set for one of the four filterable dimensions
    pub fn set(&self, dimension: Dimension) -> Option<&BTreeSet<String>> {
        match dimension {
            Dimension::Branch => Some(&self.branches),
            Dimension::City => Some(&self.cities),
            Dimension::CustomerType => Some(&self.customer_types),
            Dimension::Gender => Some(&self.genders),
            Dimension::ProductLine | Dimension::Payment => None,
        }
    }

    pub fn set_mut(&mut self, dimension: Dimension) -> Option<&mut BTreeSet<String>> {
        match dimension {
            Dimension::Branch => Some(&mut self.branches),
            Dimension::City => Some(&mut self.cities),
            Dimension::CustomerType => Some(&mut self.customer_types),
            Dimension::Gender => Some(&mut self.genders),
            Dimension::ProductLine | Dimension::Payment => None,
        }
    }

    /// Flip one value in or out of a dimension's selection. Returns whether it is now selected.
    pub fn toggle(&mut self, dimension: Dimension, value: &str) -> bool {
        match self.set_mut(dimension) {
            Some(set) => {
                if set.remove(value) {
                    false
                } else {
                    set.insert(value.to_string());
                    true
                }
            }
            None => false,
        }
    }

    pub fn is_selected(&self, dimension: Dimension, value: &str) -> bool {
        self.set(dimension).map_or(false, |set| set.contains(value))
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.branches.contains(&record.branch)
            && self.cities.contains(&record.city)
            && self.customer_types.contains(&record.customer_type)
            && self.genders.contains(&record.gender)
    }
}

/// The four dimensions the sidebar filters on, in display order
pub const FILTER_DIMENSIONS: [Dimension; 4] = [
    Dimension::Branch,
    Dimension::City,
    Dimension::CustomerType,
    Dimension::Gender,
];

/// Keep every record matching the selection, preserving input order
pub fn filter<'a, I>(records: I, selection: &FilterSelection) -> Subset<'a>
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    records
        .into_iter()
        .filter(|record| selection.matches(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_csv;

    fn dataset() -> Dataset {
        Dataset::from_reader(sample_csv().as_bytes()).unwrap()
    }

    #[test]
    fn test_default_selection_keeps_everything() {
        let dataset = dataset();
        let selection = FilterSelection::all(&dataset);

        let subset = filter(dataset.records(), &selection);
        assert_eq!(subset.len(), dataset.len());
    }

    #[test]
    fn test_gender_filter_returns_exact_rows() {
        let dataset = dataset();
        let mut selection = FilterSelection::all(&dataset);
        selection.genders = ["Female".to_string()].into_iter().collect();

        let subset = filter(dataset.records(), &selection);
        let expected = dataset
            .records()
            .iter()
            .filter(|r| r.gender == "Female")
            .count();

        assert_eq!(subset.len(), expected);
        assert_eq!(subset.len(), 4);
        assert!(subset.iter().all(|r| r.gender == "Female"));
    }

    #[test]
    fn test_subset_is_sound_and_complete() {
        let dataset = dataset();
        let mut selection = FilterSelection::all(&dataset);
        selection.branches.remove("C");
        selection.customer_types.remove("Member");

        let subset = filter(dataset.records(), &selection);

        for record in &subset {
            assert!(dataset.records().iter().any(|r| r == *record));
            assert_eq!(record.branch, "A");
            assert_eq!(record.customer_type, "Normal");
        }
        let satisfying = dataset
            .records()
            .iter()
            .filter(|r| r.branch == "A" && r.customer_type == "Normal")
            .count();
        assert_eq!(subset.len(), satisfying);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let dataset = dataset();
        let mut selection = FilterSelection::all(&dataset);
        selection.cities.remove("Naypyitaw");

        let once = filter(dataset.records(), &selection);
        let twice = filter(once.iter().copied(), &selection);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_selection_yields_empty_subset() {
        let dataset = dataset();

        assert!(filter(dataset.records(), &FilterSelection::none()).is_empty());

        let mut selection = FilterSelection::all(&dataset);
        selection.genders.clear();
        assert!(filter(dataset.records(), &selection).is_empty());
    }

    #[test]
    fn test_unknown_value_matches_nothing() {
        let dataset = dataset();
        let mut selection = FilterSelection::all(&dataset);
        selection.branches = ["Z".to_string()].into_iter().collect();

        assert!(filter(dataset.records(), &selection).is_empty());
    }

    #[test]
    fn test_toggle() {
        let dataset = dataset();
        let mut selection = FilterSelection::all(&dataset);

        assert!(!selection.toggle(Dimension::Branch, "A"));
        assert!(!selection.is_selected(Dimension::Branch, "A"));
        assert!(selection.toggle(Dimension::Branch, "A"));
        assert!(selection.is_selected(Dimension::Branch, "A"));

        // product line is not a sidebar filter
        assert!(!selection.toggle(Dimension::ProductLine, "Health and beauty"));
    }
}
