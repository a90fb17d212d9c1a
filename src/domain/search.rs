//! Donor search: conjunctive filtering and availability partitioning.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{blood_type::BloodType, compatibility::CompatibilityTable, profile::DonorProfile};

/// Constraints on a donor search.
///
/// Every field is optional; an absent field does not constrain the search.
/// Present fields are compared by exact, case-sensitive equality.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Required blood type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<BloodType>,
    /// Required country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Required state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Required city.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

impl SearchFilter {
    /// A filter that matches every donor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a blood type.
    #[must_use]
    pub fn with_blood_type(mut self, blood_type: BloodType) -> Self {
        self.blood_type = Some(blood_type);
        self
    }

    /// Require a country.
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Require a state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Require a city.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Returns `true` if the filter has no constraints.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.blood_type.is_none()
            && self.country.is_none()
            && self.state.is_none()
            && self.city.is_none()
    }

    /// Returns `true` if `donor` satisfies every present constraint.
    ///
    /// A donor with an unknown blood type never satisfies a blood type
    /// constraint.
    #[must_use]
    pub fn matches(&self, donor: &DonorProfile) -> bool {
        let blood_type = self
            .blood_type
            .is_none_or(|wanted| wanted.is_canonical() && donor.blood_type == wanted);
        blood_type && self.matches_location(donor)
    }

    fn matches_location(&self, donor: &DonorProfile) -> bool {
        fn field(wanted: Option<&String>, actual: &str) -> bool {
            wanted.is_none_or(|wanted| wanted == actual)
        }

        field(self.country.as_ref(), &donor.country)
            && field(self.state.as_ref(), &donor.state)
            && field(self.city.as_ref(), &donor.city)
    }
}

/// Matching donors, split by availability.
///
/// Both lists preserve the relative order of the input pool. Donors who never
/// stated their availability appear in neither list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SearchResult {
    /// Donors who are available.
    pub available: Vec<DonorProfile>,
    /// Donors who are not available.
    pub unavailable: Vec<DonorProfile>,
}

impl SearchResult {
    /// Returns `true` if no donor matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.unavailable.is_empty()
    }

    /// The number of donors across both lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.available.len() + self.unavailable.len()
    }

    fn partition<'a>(matches: impl Iterator<Item = &'a DonorProfile>) -> Self {
        let mut result = Self::default();
        for donor in matches {
            match donor.is_available {
                Some(true) => result.available.push(donor.clone()),
                Some(false) => result.unavailable.push(donor.clone()),
                None => {}
            }
        }
        result
    }
}

/// Find the donors in `pool` matching `filter`.
///
/// This never fails: an empty pool, or a filter nothing matches, gives an
/// empty result.
#[instrument(level = "debug", skip(pool), fields(pool = pool.len()))]
pub fn search(filter: &SearchFilter, pool: &[DonorProfile]) -> SearchResult {
    let result = SearchResult::partition(pool.iter().filter(|donor| filter.matches(donor)));
    tracing::debug!(
        available = result.available.len(),
        unavailable = result.unavailable.len(),
        "search complete"
    );
    result
}

/// Find the donors in `pool` whose blood can be given to `recipient`.
///
/// The blood type in `filter` is ignored; its location fields apply as in
/// [`search`]. An unknown recipient type matches nobody.
#[instrument(level = "debug", skip(pool), fields(pool = pool.len()))]
pub fn search_compatible(
    recipient: BloodType,
    filter: &SearchFilter,
    pool: &[DonorProfile],
) -> SearchResult {
    let donors = CompatibilityTable::can_receive_from(recipient);
    let result = SearchResult::partition(pool.iter().filter(|donor| {
        donors.contains(donor.blood_type) && filter.matches_location(donor)
    }));
    tracing::debug!(
        available = result.available.len(),
        unavailable = result.unavailable.len(),
        "compatible search complete"
    );
    result
}

/// Identifies one issued search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

impl SearchTicket {
    /// The request's sequence number.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Discards the results of superseded searches.
///
/// Each request takes a ticket when it is issued. When its result arrives it
/// is applied only if no newer ticket has been issued since, whatever order
/// the results arrive in.
#[derive(Debug, Default)]
pub struct SearchSequencer {
    latest: AtomicU64,
}

impl SearchSequencer {
    /// Create a sequencer with no requests issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issue a ticket for a new request, superseding every earlier one.
    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns `true` if `ticket` belongs to the most recently issued request.
    #[must_use]
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Pass `result` through if `ticket` is current, otherwise drop it.
    pub fn accept<T>(&self, ticket: SearchTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(ticket = ticket.0, "discarding superseded search result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donor(
        id: &str,
        blood_type: BloodType,
        country: &str,
        available: Option<bool>,
    ) -> DonorProfile {
        DonorProfile {
            id: id.to_string(),
            blood_type,
            country: country.to_string(),
            is_available: available,
            ..DonorProfile::default()
        }
    }

    fn ids(donors: &[DonorProfile]) -> Vec<&str> {
        donors.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn exact_filter_partitions_by_availability() {
        let pool = vec![
            donor("1", BloodType::APos, "IN", Some(true)),
            donor("2", BloodType::APos, "IN", Some(false)),
            donor("3", BloodType::BPos, "IN", Some(true)),
        ];
        let filter = SearchFilter::new()
            .with_blood_type(BloodType::APos)
            .with_country("IN");

        let result = search(&filter, &pool);

        assert_eq!(ids(&result.available), vec!["1"]);
        assert_eq!(ids(&result.unavailable), vec!["2"]);
    }

    #[test]
    fn empty_filter_returns_everyone_with_stated_availability_in_order() {
        let pool = vec![
            donor("a", BloodType::OPos, "US", Some(false)),
            donor("b", BloodType::Unknown, "IN", Some(true)),
            donor("c", BloodType::AbNeg, "IN", None),
            donor("d", BloodType::ANeg, "GB", Some(true)),
            donor("e", BloodType::BNeg, "US", Some(false)),
        ];

        let result = search(&SearchFilter::new(), &pool);

        assert_eq!(ids(&result.available), vec!["b", "d"]);
        assert_eq!(ids(&result.unavailable), vec!["a", "e"]);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn location_comparison_is_case_sensitive() {
        let pool = vec![donor("1", BloodType::OPos, "in", Some(true))];
        let result = search(&SearchFilter::new().with_country("IN"), &pool);
        assert!(result.is_empty());
    }

    #[test]
    fn every_location_level_must_match() {
        let mut first = donor("1", BloodType::OPos, "US", Some(true));
        first.state = "CA".to_string();
        first.city = "LA".to_string();
        let mut second = first.clone();
        second.id = "2".to_string();
        second.city = "SF".to_string();
        let pool = vec![first, second];

        let filter = SearchFilter::new()
            .with_country("US")
            .with_state("CA")
            .with_city("SF");
        assert_eq!(ids(&search(&filter, &pool).available), vec!["2"]);
    }

    #[test]
    fn unknown_blood_type_never_matches_type_filter() {
        let pool = vec![donor("1", BloodType::Unknown, "IN", Some(true))];
        let filter = SearchFilter::new().with_blood_type(BloodType::Unknown);
        assert!(search(&filter, &pool).is_empty());
    }

    #[test]
    fn empty_pool_is_empty_result() {
        let result = search(&SearchFilter::new().with_blood_type(BloodType::ONeg), &[]);
        assert_eq!(result, SearchResult::default());
    }

    #[test]
    fn searching_twice_is_idempotent() {
        let pool = vec![
            donor("1", BloodType::APos, "IN", Some(true)),
            donor("2", BloodType::BPos, "IN", Some(false)),
        ];
        let filter = SearchFilter::new().with_country("IN");
        let once = search(&filter, &pool);
        let mut refiltered = once.available.clone();
        refiltered.extend(once.unavailable.clone());
        assert_eq!(search(&filter, &refiltered), once);
    }

    #[test]
    fn compatible_search_uses_reception_set() {
        let pool = vec![
            donor("1", BloodType::ONeg, "IN", Some(true)),
            donor("2", BloodType::APos, "IN", Some(true)),
            donor("3", BloodType::ANeg, "IN", Some(false)),
            donor("4", BloodType::BNeg, "IN", Some(true)),
            donor("5", BloodType::Unknown, "IN", Some(true)),
            donor("6", BloodType::ONeg, "US", Some(true)),
        ];
        let filter = SearchFilter::new()
            .with_country("IN")
            .with_blood_type(BloodType::BPos);

        let result = search_compatible(BloodType::ANeg, &filter, &pool);

        assert_eq!(ids(&result.available), vec!["1"]);
        assert_eq!(ids(&result.unavailable), vec!["3"]);
    }

    #[test]
    fn compatible_search_for_unknown_recipient_is_empty() {
        let pool = vec![donor("1", BloodType::ONeg, "IN", Some(true))];
        assert!(search_compatible(BloodType::Unknown, &SearchFilter::new(), &pool).is_empty());
    }

    #[test]
    fn sequencer_only_accepts_latest_ticket() {
        let sequencer = SearchSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();
        assert!(second > first);

        // results arrive out of order
        assert_eq!(sequencer.accept(second, "second"), Some("second"));
        assert_eq!(sequencer.accept(first, "first"), None);

        let third = sequencer.issue();
        assert_eq!(sequencer.accept(second, "second again"), None);
        assert_eq!(sequencer.accept(third, "third"), Some("third"));
        assert_eq!(third.sequence(), 3);
    }

    #[test]
    fn filter_round_trips_through_json() {
        let filter: SearchFilter =
            serde_json::from_str(r#"{"bloodType":"AB-","city":"Pune"}"#).unwrap();
        assert_eq!(
            filter,
            SearchFilter::new()
                .with_blood_type(BloodType::AbNeg)
                .with_city("Pune")
        );
        assert!(!filter.is_empty());
        assert!(SearchFilter::new().is_empty());
    }

    #[test]
    fn blood_type_codes_are_case_sensitive_on_the_wire() {
        assert!(serde_json::from_str::<SearchFilter>(r#"{"bloodType":"a+"}"#).is_err());
        assert!(
            serde_json::from_str::<Vec<DonorProfile>>(r#"[{"id":2,"bloodType":" a+ "}]"#)
                .is_err()
        );

        let filter: SearchFilter = serde_json::from_str(r#"{"bloodType":"A+"}"#).unwrap();
        let pool: Vec<DonorProfile> = serde_json::from_str(
            r#"[{"id":1,"bloodType":"A+","isAvailable":true},
                {"id":2,"bloodType":"A-","isAvailable":true}]"#,
        )
        .unwrap();
        assert_eq!(ids(&search(&filter, &pool).available), vec!["1"]);
    }
}
