use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An ABO/Rh blood type.
///
/// The eight canonical groups are the only donatable types. [`Unknown`] marks
/// a profile whose blood type has not been recorded; it is not a ninth group
/// and is compatible with nothing.
///
/// [`Unknown`]: BloodType::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BloodType {
    /// O negative.
    ONeg,
    /// O positive.
    OPos,
    /// A negative.
    ANeg,
    /// A positive.
    APos,
    /// B negative.
    BNeg,
    /// B positive.
    BPos,
    /// AB negative.
    AbNeg,
    /// AB positive.
    AbPos,
    /// Blood type not recorded.
    #[default]
    Unknown,
}

impl BloodType {
    /// The eight canonical blood types, in table order.
    pub const ALL: [Self; 8] = [
        Self::ONeg,
        Self::OPos,
        Self::ANeg,
        Self::APos,
        Self::BNeg,
        Self::BPos,
        Self::AbNeg,
        Self::AbPos,
    ];

    /// Returns `true` for the eight donatable types and `false` for
    /// [`BloodType::Unknown`].
    #[must_use]
    pub const fn is_canonical(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Position of the type in [`BloodType::ALL`], or `None` for `Unknown`.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::ONeg => Some(0),
            Self::OPos => Some(1),
            Self::ANeg => Some(2),
            Self::APos => Some(3),
            Self::BNeg => Some(4),
            Self::BPos => Some(5),
            Self::AbNeg => Some(6),
            Self::AbPos => Some(7),
            Self::Unknown => None,
        }
    }

    /// The canonical code, e.g. `"AB+"`.
    ///
    /// `Unknown` renders as `"unknown"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ONeg => "O-",
            Self::OPos => "O+",
            Self::ANeg => "A-",
            Self::APos => "A+",
            Self::BNeg => "B-",
            Self::BPos => "B+",
            Self::AbNeg => "AB-",
            Self::AbPos => "AB+",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a string is not a recognised blood type code.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
#[error("Invalid blood type '{0}': expected one of O-, O+, A-, A+, B-, B+, AB-, AB+")]
pub struct InvalidBloodType(pub String);

impl FromStr for BloodType {
    type Err = InvalidBloodType;

    /// Codes are matched exactly: `"a+"` and `" A+"` are not blood types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "unknown" | "Unknown" => Ok(Self::Unknown),
            code => Self::ALL
                .into_iter()
                .find(|blood_type| blood_type.code() == code)
                .ok_or_else(|| InvalidBloodType(s.to_string())),
        }
    }
}

impl TryFrom<&str> for BloodType {
    type Error = InvalidBloodType;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl Serialize for BloodType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for BloodType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `null` is the same as an unrecorded blood type
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map_or(Ok(Self::Unknown), |code| {
            code.parse().map_err(serde::de::Error::custom)
        })
    }
}

/// An immutable set of canonical blood types.
///
/// Stored as a bitset indexed by position in [`BloodType::ALL`]. Iteration
/// always yields types in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BloodTypeSet(u8);

impl BloodTypeSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// The set of all eight canonical types.
    pub const ALL: Self = Self(u8::MAX);

    pub(crate) const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns `true` if the set contains `blood_type`.
    ///
    /// Always `false` for [`BloodType::Unknown`].
    #[must_use]
    pub const fn contains(self, blood_type: BloodType) -> bool {
        match blood_type.index() {
            Some(i) => self.0 & (1 << i) != 0,
            None => false,
        }
    }

    /// The number of types in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the members in canonical order.
    pub fn iter(self) -> impl Iterator<Item = BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(move |blood_type| self.contains(*blood_type))
    }
}

impl FromIterator<BloodType> for BloodTypeSet {
    fn from_iter<I: IntoIterator<Item = BloodType>>(iter: I) -> Self {
        let bits = iter
            .into_iter()
            .filter_map(BloodType::index)
            .fold(0u8, |bits, i| bits | (1 << i));
        Self(bits)
    }
}

impl IntoIterator for BloodTypeSet {
    type Item = BloodType;
    type IntoIter = std::vec::IntoIter<BloodType>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

impl fmt::Display for BloodTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let codes = self.iter().map(BloodType::code).collect::<Vec<_>>();
        write!(f, "{}", codes.join(", "))
    }
}

impl Serialize for BloodTypeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("O-", BloodType::ONeg; "o negative")]
    #[test_case("O+", BloodType::OPos; "o positive")]
    #[test_case("A-", BloodType::ANeg; "a negative")]
    #[test_case("A+", BloodType::APos; "a positive")]
    #[test_case("B-", BloodType::BNeg; "b negative")]
    #[test_case("B+", BloodType::BPos; "b positive")]
    #[test_case("AB-", BloodType::AbNeg; "ab negative")]
    #[test_case("AB+", BloodType::AbPos; "ab positive")]
    #[test_case("", BloodType::Unknown; "empty is unknown")]
    #[test_case("Unknown", BloodType::Unknown; "unknown marker")]
    fn parse_valid(input: &str, expected: BloodType) {
        assert_eq!(input.parse::<BloodType>().unwrap(), expected);
    }

    #[test_case("C+"; "no such group")]
    #[test_case("A"; "missing rh")]
    #[test_case("AB"; "missing rh on ab")]
    #[test_case("O positive"; "spelled out")]
    #[test_case("BA+"; "reversed")]
    #[test_case("a+"; "lowercase")]
    #[test_case("ab-"; "lowercase ab")]
    #[test_case(" A+ "; "padded")]
    #[test_case("UNKNOWN"; "shouted unknown marker")]
    fn parse_invalid(input: &str) {
        assert_eq!(
            input.parse::<BloodType>(),
            Err(InvalidBloodType(input.to_string()))
        );
    }

    #[test]
    fn display_matches_code() {
        for blood_type in BloodType::ALL {
            assert_eq!(
                blood_type.to_string().parse::<BloodType>().unwrap(),
                blood_type
            );
        }
        assert_eq!(BloodType::AbPos.to_string(), "AB+");
    }

    #[test]
    fn unknown_is_not_canonical() {
        assert!(!BloodType::Unknown.is_canonical());
        assert!(BloodType::ALL.iter().all(|t| t.is_canonical()));
        assert_eq!(BloodType::Unknown.index(), None);
    }

    #[test]
    fn deserialize_null_and_codes() {
        let types: Vec<BloodType> =
            serde_json::from_str(r#"["A+", null, "", "unknown", "AB-"]"#).unwrap();
        assert_eq!(
            types,
            vec![
                BloodType::APos,
                BloodType::Unknown,
                BloodType::Unknown,
                BloodType::Unknown,
                BloodType::AbNeg,
            ]
        );
    }

    #[test]
    fn deserialize_rejects_unrecognised_code() {
        let error = serde_json::from_str::<BloodType>(r#""Z+""#).unwrap_err();
        assert!(error.to_string().contains("Invalid blood type 'Z+'"));
    }

    #[test]
    fn deserialize_is_case_sensitive() {
        let error = serde_json::from_str::<BloodType>(r#""a+""#).unwrap_err();
        assert!(error.to_string().contains("Invalid blood type 'a+'"));
        assert!(serde_json::from_str::<BloodType>(r#"" A+ ""#).is_err());
    }

    #[test]
    fn set_ignores_unknown() {
        let set: BloodTypeSet = [BloodType::APos, BloodType::Unknown, BloodType::APos]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(BloodType::APos));
        assert!(!set.contains(BloodType::Unknown));
    }

    #[test]
    fn set_iterates_in_canonical_order() {
        let set: BloodTypeSet = [BloodType::AbPos, BloodType::ONeg, BloodType::BPos]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![BloodType::ONeg, BloodType::BPos, BloodType::AbPos]
        );
        assert_eq!(set.to_string(), "O-, B+, AB+");
    }

    #[test]
    fn full_and_empty_sets() {
        assert_eq!(BloodTypeSet::ALL.len(), 8);
        assert!(BloodTypeSet::EMPTY.is_empty());
        assert_eq!(BloodTypeSet::EMPTY.to_string(), "");
    }
}
