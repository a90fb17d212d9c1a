//! The ABO/Rh transfusion compatibility relation.
//!
//! Only the donation direction is authored. The reception direction is
//! computed from it at compile time, so the two views are always inverses of
//! each other.

use std::fmt;

use serde::Serialize;

use super::blood_type::{BloodType, BloodTypeSet, InvalidBloodType};

// Bit i corresponds to `BloodType::ALL[i]`:
// O-, O+, A-, A+, B-, B+, AB-, AB+
const O_NEG: u8 = 1 << 0;
const O_POS: u8 = 1 << 1;
const A_NEG: u8 = 1 << 2;
const A_POS: u8 = 1 << 3;
const B_NEG: u8 = 1 << 4;
const B_POS: u8 = 1 << 5;
const AB_NEG: u8 = 1 << 6;
const AB_POS: u8 = 1 << 7;

/// Row `i` is the set of types that `BloodType::ALL[i]` can donate to.
const DONATES_TO: [u8; 8] = [
    O_NEG | O_POS | A_NEG | A_POS | B_NEG | B_POS | AB_NEG | AB_POS,
    O_POS | A_POS | B_POS | AB_POS,
    A_NEG | A_POS | AB_NEG | AB_POS,
    A_POS | AB_POS,
    B_NEG | B_POS | AB_NEG | AB_POS,
    B_POS | AB_POS,
    AB_NEG | AB_POS,
    AB_POS,
];

const RECEIVES_FROM: [u8; 8] = invert(DONATES_TO);

const fn invert(table: [u8; 8]) -> [u8; 8] {
    let mut inverse = [0u8; 8];
    let mut donor = 0;
    while donor < 8 {
        let mut recipient = 0;
        while recipient < 8 {
            if table[donor] & (1 << recipient) != 0 {
                inverse[recipient] |= 1 << donor;
            }
            recipient += 1;
        }
        donor += 1;
    }
    inverse
}

/// How widely a blood type can donate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DonorClass {
    /// Can donate to every type.
    Universal,
    /// Can donate to half of the types.
    Common,
    /// Can donate to a quarter of the types.
    Selective,
    /// Can donate only to its own type.
    Rare,
}

/// How widely a blood type can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiverClass {
    /// Can receive from every type.
    Universal,
    /// Can receive from half of the types.
    Common,
    /// Can receive from a quarter of the types.
    Limited,
    /// Can receive only from its own type.
    Selective,
}

impl DonorClass {
    const fn from_reach(reach: usize) -> Self {
        match reach {
            8.. => Self::Universal,
            4..=7 => Self::Common,
            2..=3 => Self::Selective,
            _ => Self::Rare,
        }
    }
}

impl ReceiverClass {
    const fn from_reach(reach: usize) -> Self {
        match reach {
            8.. => Self::Universal,
            4..=7 => Self::Common,
            2..=3 => Self::Limited,
            _ => Self::Selective,
        }
    }
}

impl fmt::Display for DonorClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Self::Universal => "Universal Donor",
            Self::Common => "Common Donor",
            Self::Selective => "Selective Donor",
            Self::Rare => "Rare Donor",
        };
        f.write_str(label)
    }
}

impl fmt::Display for ReceiverClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Self::Universal => "Universal Receiver",
            Self::Common => "Common Receiver",
            Self::Limited => "Limited Receiver",
            Self::Selective => "Selective Receiver",
        };
        f.write_str(label)
    }
}

/// The donor and receiver classes of a blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    /// Classification in the donation direction.
    pub donor_class: DonorClass,
    /// Classification in the reception direction.
    pub receiver_class: ReceiverClass,
}

/// Everything the table knows about one blood type, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityProfile {
    /// The blood type described.
    pub blood_type: BloodType,
    /// Types this type can donate to.
    pub donates_to: BloodTypeSet,
    /// Types this type can receive from.
    pub receives_from: BloodTypeSet,
    /// Donor and receiver classes, or `None` for the unknown marker.
    #[serde(flatten)]
    pub classification: Option<Classification>,
}

/// The fixed compatibility relation between the eight canonical blood types.
///
/// This is a zero-sized handle onto process-wide constant data.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityTable;

impl CompatibilityTable {
    /// The types that `blood_type` can donate to.
    ///
    /// Returns the empty set for [`BloodType::Unknown`].
    #[must_use]
    pub const fn can_donate_to(blood_type: BloodType) -> BloodTypeSet {
        match blood_type.index() {
            Some(i) => BloodTypeSet::from_bits(DONATES_TO[i]),
            None => BloodTypeSet::EMPTY,
        }
    }

    /// The types that `blood_type` can receive from.
    ///
    /// Returns the empty set for [`BloodType::Unknown`].
    #[must_use]
    pub const fn can_receive_from(blood_type: BloodType) -> BloodTypeSet {
        match blood_type.index() {
            Some(i) => BloodTypeSet::from_bits(RECEIVES_FROM[i]),
            None => BloodTypeSet::EMPTY,
        }
    }

    /// Like [`CompatibilityTable::can_donate_to`], from a raw type code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBloodType`] if `code` is not a blood type code or the
    /// unknown marker.
    pub fn can_donate_to_code(code: &str) -> Result<BloodTypeSet, InvalidBloodType> {
        Ok(Self::can_donate_to(code.parse()?))
    }

    /// Like [`CompatibilityTable::can_receive_from`], from a raw type code.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBloodType`] if `code` is not a blood type code or the
    /// unknown marker.
    pub fn can_receive_from_code(code: &str) -> Result<BloodTypeSet, InvalidBloodType> {
        Ok(Self::can_receive_from(code.parse()?))
    }

    /// Returns `true` if blood from `donor` can be given to `recipient`.
    #[must_use]
    pub const fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
        Self::can_donate_to(donor).contains(recipient)
    }

    /// Classify a blood type by the reach of its compatibility sets.
    ///
    /// Returns `None` for [`BloodType::Unknown`], which has no compatibility.
    #[must_use]
    pub const fn classify(blood_type: BloodType) -> Option<Classification> {
        if !blood_type.is_canonical() {
            return None;
        }
        Some(Classification {
            donor_class: DonorClass::from_reach(Self::can_donate_to(blood_type).len()),
            receiver_class: ReceiverClass::from_reach(Self::can_receive_from(blood_type).len()),
        })
    }

    /// Collect both directions and the classification of a blood type.
    #[must_use]
    pub const fn profile(blood_type: BloodType) -> CompatibilityProfile {
        CompatibilityProfile {
            blood_type,
            donates_to: Self::can_donate_to(blood_type),
            receives_from: Self::can_receive_from(blood_type),
            classification: Self::classify(blood_type),
        }
    }
}
