//! Donor eligibility from date of birth and signup reason.
//!
//! Eligibility depends on the passage of time, so it is never stored. Callers
//! evaluate it against an explicit `now` every time they need it.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::profile::UserProfile;

/// The reason a user gave when signing up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignupReason {
    /// Willing to donate now or later.
    #[default]
    DonateLater,
    /// Excluded from donating by a health condition.
    HealthIssue,
    /// Signed up before reaching the minimum age.
    UnderAge,
    /// Signed up above the maximum age.
    AboveAge,
}

/// The inclusive age window within which a person may donate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityPolicy {
    /// Youngest eligible age in whole years.
    pub minimum_age: u32,
    /// Oldest eligible age in whole years.
    pub maximum_age: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            minimum_age: 18,
            maximum_age: 65,
        }
    }
}

/// Time left until a person reaches the minimum donation age.
///
/// Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Remaining(TimeDelta);

impl Remaining {
    /// Clamp a signed duration to a non-negative countdown.
    #[must_use]
    pub fn new(delta: TimeDelta) -> Self {
        Self(delta.max(TimeDelta::zero()))
    }

    /// Returns `true` once the countdown has elapsed.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Whole days left.
    #[must_use]
    pub fn days(&self) -> i64 {
        self.0.num_days()
    }

    /// Hours left after whole days are removed (0-23).
    #[must_use]
    pub fn hours(&self) -> i64 {
        self.0.num_hours() % 24
    }

    /// Minutes left after whole hours are removed (0-59).
    #[must_use]
    pub fn minutes(&self) -> i64 {
        self.0.num_minutes() % 60
    }

    /// Seconds left after whole minutes are removed (0-59).
    #[must_use]
    pub fn seconds(&self) -> i64 {
        self.0.num_seconds() % 60
    }

    /// The underlying duration.
    #[must_use]
    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m",
            self.days(),
            self.hours(),
            self.minutes()
        )
    }
}

impl Serialize for Remaining {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Remaining", 4)?;
        state.serialize_field("days", &self.days())?;
        state.serialize_field("hours", &self.hours())?;
        state.serialize_field("minutes", &self.minutes())?;
        state.serialize_field("totalSeconds", &self.0.num_seconds())?;
        state.end()
    }
}

/// What a user may do, as of a particular instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum EligibilityState {
    /// Within the age window and not health-excluded.
    Eligible,
    /// Too young; `remaining` counts down to the minimum age.
    UnderAge {
        /// Time until the minimum age is reached.
        remaining: Remaining,
    },
    /// Older than the maximum age.
    AboveAge,
    /// Excluded by a stated health issue.
    HealthExcluded,
    /// Not enough information; the profile needs completing.
    Unknown,
}

impl EligibilityState {
    /// Returns `true` if the user may donate now.
    #[must_use]
    pub const fn may_donate(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// Returns `true` if the caller should prompt for a profile update.
    #[must_use]
    pub const fn needs_profile_update(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for EligibilityState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Eligible => f.write_str("eligible"),
            Self::UnderAge { remaining } => write!(f, "under age ({remaining} remaining)"),
            Self::AboveAge => f.write_str("above age"),
            Self::HealthExcluded => f.write_str("excluded for health reasons"),
            Self::Unknown => f.write_str("unknown (profile incomplete)"),
        }
    }
}

/// Errors from interpreting a date of birth.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum EligibilityError {
    /// The date of birth could not be parsed.
    #[error("Invalid date of birth '{0}': expected YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDate(String),
}

/// Parse a stored date of birth.
///
/// Accepts a plain calendar date (`2001-04-30`) or an RFC 3339 timestamp, in
/// which case only the date part is used.
///
/// # Errors
///
/// Returns [`EligibilityError::InvalidDate`] if the string is neither.
pub fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, EligibilityError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| EligibilityError::InvalidDate(raw.to_string()))
}

/// Whole years between `dob` and `on`, counting a year only once the
/// birthday has been reached.
#[must_use]
pub fn age_on(dob: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// The date on which someone born on `dob` turns `years` old.
///
/// A 29 February birthday falls on 1 March in non-leap years, matching
/// [`age_on`].
fn anniversary(dob: NaiveDate, years: u32) -> Option<NaiveDate> {
    let year = dob.year().checked_add(i32::try_from(years).ok()?)?;
    NaiveDate::from_ymd_opt(year, dob.month(), dob.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Classifies users into an [`EligibilityState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EligibilityClassifier {
    policy: EligibilityPolicy,
}

impl EligibilityClassifier {
    /// Create a classifier for the given age window.
    #[must_use]
    pub const fn new(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    /// The age window in use.
    #[must_use]
    pub const fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// Classify a profile as of `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile's date of birth is present but cannot
    /// be parsed.
    pub fn classify(
        &self,
        profile: &UserProfile,
        now: NaiveDateTime,
    ) -> Result<EligibilityState, EligibilityError> {
        let dob = profile
            .date_of_birth
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(parse_date_of_birth)
            .transpose()?;
        self.evaluate(dob, profile.signup_reason, now)
    }

    /// Evaluate eligibility at the instant `now`.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::InvalidDate`] if the minimum-age birthday
    /// of `dob` is out of range.
    #[instrument(level = "debug", skip(self))]
    pub fn evaluate(
        &self,
        dob: Option<NaiveDate>,
        reason: SignupReason,
        now: NaiveDateTime,
    ) -> Result<EligibilityState, EligibilityError> {
        let Some(dob) = dob else {
            return Ok(EligibilityState::Unknown);
        };

        let age = age_on(dob, now.date());

        let state = if reason == SignupReason::HealthIssue {
            EligibilityState::HealthExcluded
        } else if age < self.minimum_age() {
            EligibilityState::UnderAge {
                remaining: self.remaining(dob, now)?,
            }
        } else if age > self.maximum_age() {
            EligibilityState::AboveAge
        } else {
            EligibilityState::Eligible
        };

        tracing::debug!(age, %state, "evaluated eligibility");
        Ok(state)
    }

    /// The first instant at which someone born on `dob` reaches the minimum
    /// age.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::InvalidDate`] if the date is out of range.
    pub fn eligible_from(&self, dob: NaiveDate) -> Result<NaiveDateTime, EligibilityError> {
        anniversary(dob, self.policy.minimum_age)
            .map(|date| date.and_time(NaiveTime::MIN))
            .ok_or_else(|| EligibilityError::InvalidDate(dob.to_string()))
    }

    /// Time from `now` until someone born on `dob` reaches the minimum age.
    ///
    /// Always recomputed from the absolute target. Zero once it has passed.
    ///
    /// # Errors
    ///
    /// Returns [`EligibilityError::InvalidDate`] if the date is out of range.
    pub fn remaining(
        &self,
        dob: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Remaining, EligibilityError> {
        Ok(Remaining::new(self.eligible_from(dob)? - now))
    }

    fn minimum_age(&self) -> i32 {
        i32::try_from(self.policy.minimum_age).unwrap_or(i32::MAX)
    }

    fn maximum_age(&self) -> i32 {
        i32::try_from(self.policy.maximum_age).unwrap_or(i32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Months, NaiveDate, NaiveDateTime};
    use test_case::test_case;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
        today.checked_sub_months(Months::new(years * 12)).unwrap()
    }

    fn evaluate(dob: NaiveDate, now: NaiveDateTime) -> EligibilityState {
        EligibilityClassifier::default()
            .evaluate(Some(dob), SignupReason::DonateLater, now)
            .unwrap()
    }

    #[test]
    fn missing_date_of_birth_is_unknown() {
        let state = EligibilityClassifier::default()
            .evaluate(None, SignupReason::HealthIssue, at(2024, 1, 1, 0, 0))
            .unwrap();
        assert_eq!(state, EligibilityState::Unknown);
        assert!(state.needs_profile_update());
    }

    #[test]
    fn exactly_eighteen_is_eligible() {
        let now = at(2024, 6, 15, 9, 30);
        assert_eq!(
            evaluate(years_before(now.date(), 18), now),
            EligibilityState::Eligible
        );
    }

    #[test]
    fn one_day_short_of_eighteen_is_under_age() {
        let now = at(2024, 6, 15, 9, 30);
        let dob = years_before(now.date(), 18) + Days::new(1);
        let EligibilityState::UnderAge { remaining } = evaluate(dob, now) else {
            panic!("expected under age");
        };
        assert!(!remaining.is_zero());
        assert_eq!(remaining.days(), 0);
        assert_eq!(remaining.hours(), 14);
        assert_eq!(remaining.minutes(), 30);
    }

    #[test]
    fn exactly_sixty_five_is_eligible() {
        let now = at(2024, 6, 15, 12, 0);
        assert_eq!(
            evaluate(years_before(now.date(), 65), now),
            EligibilityState::Eligible
        );
    }

    #[test]
    fn one_day_past_sixty_five_is_above_age() {
        let now = at(2024, 6, 15, 12, 0);
        let dob = years_before(now.date(), 65) - Days::new(1);
        assert_eq!(evaluate(dob, now), EligibilityState::AboveAge);
    }

    #[test_case(SignupReason::HealthIssue, date(1990, 1, 1), EligibilityState::HealthExcluded; "adult with health issue")]
    #[test_case(SignupReason::HealthIssue, date(2015, 1, 1), EligibilityState::HealthExcluded; "health issue overrides under age")]
    #[test_case(SignupReason::HealthIssue, date(1940, 1, 1), EligibilityState::HealthExcluded; "health issue overrides above age")]
    #[test_case(SignupReason::AboveAge, date(1990, 1, 1), EligibilityState::Eligible; "stated reason does not override age")]
    #[test_case(SignupReason::UnderAge, date(1950, 1, 1), EligibilityState::AboveAge; "stated under age but actually old")]
    fn signup_reason(reason: SignupReason, dob: NaiveDate, expected: EligibilityState) {
        let state = EligibilityClassifier::default()
            .evaluate(Some(dob), reason, at(2024, 6, 15, 0, 0))
            .unwrap();
        assert_eq!(state, expected);
    }

    #[test]
    fn countdown_decreases_and_reaches_zero_at_birthday() {
        let classifier = EligibilityClassifier::default();
        let dob = date(2008, 3, 10);
        let t1 = at(2026, 3, 1, 8, 0);
        let t2 = at(2026, 3, 9, 23, 59);

        let r1 = classifier.remaining(dob, t1).unwrap();
        let r2 = classifier.remaining(dob, t2).unwrap();
        assert!(r1 > r2);
        assert_eq!(r2.minutes(), 1);

        let birthday = at(2026, 3, 10, 0, 0);
        assert!(classifier.remaining(dob, birthday).unwrap().is_zero());
        assert_eq!(evaluate(dob, birthday), EligibilityState::Eligible);
        assert!(classifier
            .remaining(dob, birthday + TimeDelta::hours(5))
            .unwrap()
            .is_zero());
    }

    #[test]
    fn leap_day_birthday_turns_eighteen_on_first_of_march() {
        let classifier = EligibilityClassifier::default();
        let dob = date(2008, 2, 29);
        assert_eq!(classifier.eligible_from(dob).unwrap(), at(2026, 3, 1, 0, 0));
        assert!(matches!(
            evaluate(dob, at(2026, 2, 28, 23, 0)),
            EligibilityState::UnderAge { .. }
        ));
        assert_eq!(evaluate(dob, at(2026, 3, 1, 0, 0)), EligibilityState::Eligible);
    }

    #[test]
    fn health_issue_with_future_date_of_birth_is_excluded() {
        let state = EligibilityClassifier::default()
            .evaluate(
                Some(date(2024, 6, 1)),
                SignupReason::HealthIssue,
                at(2024, 1, 1, 0, 0),
            )
            .unwrap();
        assert_eq!(state, EligibilityState::HealthExcluded);
    }

    #[test]
    fn future_date_of_birth_counts_down_to_eighteenth_birthday() {
        let now = at(2024, 1, 1, 0, 0);
        let state = evaluate(date(2030, 1, 1), now);
        let EligibilityState::UnderAge { remaining } = state else {
            panic!("expected under age, got {state:?}");
        };
        assert_eq!(remaining.as_delta(), at(2048, 1, 1, 0, 0) - now);
    }

    #[test]
    fn custom_policy_moves_boundaries() {
        let classifier = EligibilityClassifier::new(EligibilityPolicy {
            minimum_age: 17,
            maximum_age: 70,
        });
        let now = at(2024, 6, 15, 0, 0);
        let state = classifier
            .evaluate(Some(years_before(now.date(), 17)), SignupReason::DonateLater, now)
            .unwrap();
        assert_eq!(state, EligibilityState::Eligible);
        let state = classifier
            .evaluate(Some(years_before(now.date(), 70)), SignupReason::DonateLater, now)
            .unwrap();
        assert_eq!(state, EligibilityState::Eligible);
    }

    #[test_case("2001-04-30", date(2001, 4, 30); "plain date")]
    #[test_case(" 2001-04-30 ", date(2001, 4, 30); "padded date")]
    #[test_case("2001-04-30T22:15:00Z", date(2001, 4, 30); "rfc3339 utc")]
    #[test_case("2001-04-30T01:00:00+05:30", date(2001, 4, 30); "rfc3339 offset")]
    fn parse_valid_dates(raw: &str, expected: NaiveDate) {
        assert_eq!(parse_date_of_birth(raw).unwrap(), expected);
    }

    #[test_case("30/04/2001"; "day first")]
    #[test_case("2001-02-30"; "no such day")]
    #[test_case("yesterday"; "words")]
    fn parse_invalid_dates(raw: &str) {
        assert_eq!(
            parse_date_of_birth(raw),
            Err(EligibilityError::InvalidDate(raw.to_string()))
        );
    }

    #[test]
    fn classify_profile_reports_invalid_date() {
        let profile = UserProfile {
            date_of_birth: Some("not a date".to_string()),
            ..UserProfile::default()
        };
        let result = EligibilityClassifier::default().classify(&profile, at(2024, 1, 1, 0, 0));
        assert_eq!(
            result,
            Err(EligibilityError::InvalidDate("not a date".to_string()))
        );
    }

    #[test]
    fn classify_profile_with_blank_date_is_unknown() {
        let profile = UserProfile {
            date_of_birth: Some("  ".to_string()),
            ..UserProfile::default()
        };
        let state = EligibilityClassifier::default()
            .classify(&profile, at(2024, 1, 1, 0, 0))
            .unwrap();
        assert_eq!(state, EligibilityState::Unknown);
    }

    #[test]
    fn remaining_display() {
        let remaining = Remaining::new(TimeDelta::days(12) + TimeDelta::minutes(4 * 60 + 7));
        assert_eq!(remaining.to_string(), "12d 04h 07m");
        assert!(Remaining::new(TimeDelta::seconds(-30)).is_zero());
    }

    #[test]
    fn state_serializes_with_tag() {
        let json = serde_json::to_value(EligibilityState::UnderAge {
            remaining: Remaining::new(TimeDelta::hours(25)),
        })
        .unwrap();
        assert_eq!(json["state"], "underAge");
        assert_eq!(json["remaining"]["days"], 1);
        assert_eq!(json["remaining"]["hours"], 1);
    }
}
