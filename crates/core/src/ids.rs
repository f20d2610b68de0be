//! Identifier allocation.
//!
//! Patients, appointments and medical records draw ids from persisted monotonic counters.
//! Doctors are the exception: historically their id was recomputed as `max + 1` over the
//! current list, which hands a deleted doctor's id to the next doctor added when the deleted
//! one held the highest id. [`DoctorIdPolicy`] makes that choice explicit.

use crate::constants::{RECORD_NUMBER_TAG, RECORD_NUMBER_WIDTH};
use crate::error::{ClinicError, ClinicResult};
use std::fmt;
use std::str::FromStr;

pub type PatientId = u32;
pub type DoctorId = u32;
pub type AppointmentId = u32;
pub type MedicalRecordId = u32;

/// How new doctor ids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoctorIdPolicy {
    /// `max(existing ids, 0) + 1`. Reuses the id of a deleted highest-id doctor.
    #[default]
    MaxPlusOne,
    /// Persisted monotonic counter, like the other collections. Never reuses an id.
    Counter,
}

impl DoctorIdPolicy {
    pub fn code(self) -> &'static str {
        match self {
            DoctorIdPolicy::MaxPlusOne => "max-plus-one",
            DoctorIdPolicy::Counter => "counter",
        }
    }
}

impl fmt::Display for DoctorIdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DoctorIdPolicy {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max-plus-one" | "max+1" => Ok(DoctorIdPolicy::MaxPlusOne),
            "counter" => Ok(DoctorIdPolicy::Counter),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown doctor id policy '{other}' (expected max-plus-one or counter)"
            ))),
        }
    }
}

/// `max(ids, 0) + 1`. `key` names the collection in the error when the maximum is `u32::MAX`.
pub(crate) fn max_plus_one(key: &str, ids: impl IntoIterator<Item = u32>) -> ClinicResult<u32> {
    successor(key, ids.into_iter().max().unwrap_or(0))
}

/// The id after `id`, or `CounterExhausted` when `id` is the last representable one.
pub(crate) fn successor(key: &str, id: u32) -> ClinicResult<u32> {
    id.checked_add(1).ok_or_else(|| ClinicError::CounterExhausted {
        key: key.to_string(),
    })
}

/// Formats the record number for a patient counter value, e.g. `7` -> `RM007`.
///
/// Values wider than the padding are kept in full (`1234` -> `RM1234`).
pub fn format_record_number(counter: u32) -> String {
    format!(
        "{RECORD_NUMBER_TAG}{counter:0width$}",
        width = RECORD_NUMBER_WIDTH
    )
}

/// Parses a persisted counter value.
pub(crate) fn parse_counter(key: &str, raw: &str) -> ClinicResult<u32> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ClinicError::CorruptCounter {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record_number_pads_to_three_digits() {
        assert_eq!(format_record_number(1), "RM001");
        assert_eq!(format_record_number(42), "RM042");
        assert_eq!(format_record_number(999), "RM999");
    }

    #[test]
    fn test_format_record_number_keeps_wide_values() {
        assert_eq!(format_record_number(1234), "RM1234");
    }

    #[test]
    fn test_max_plus_one() {
        assert_eq!(max_plus_one("k", []).expect("empty list"), 1);
        assert_eq!(max_plus_one("k", [1, 2, 3]).expect("small ids"), 4);
        assert_eq!(max_plus_one("k", [5, 2]).expect("unsorted ids"), 6);
    }

    #[test]
    fn test_max_plus_one_reports_exhaustion_instead_of_overflowing() {
        let err = max_plus_one("rme_doctors", [2, u32::MAX]).expect_err("should be exhausted");
        assert!(matches!(err, ClinicError::CounterExhausted { key } if key == "rme_doctors"));
    }

    #[test]
    fn test_successor() {
        assert_eq!(successor("k", 1).expect("should advance"), 2);
        assert!(matches!(
            successor("k", u32::MAX),
            Err(ClinicError::CounterExhausted { .. })
        ));
    }

    #[test]
    fn test_doctor_id_policy_parse() {
        assert_eq!(
            "counter".parse::<DoctorIdPolicy>().expect("should parse"),
            DoctorIdPolicy::Counter
        );
        assert_eq!(
            "Max-Plus-One".parse::<DoctorIdPolicy>().expect("should parse"),
            DoctorIdPolicy::MaxPlusOne
        );
        assert!("random".parse::<DoctorIdPolicy>().is_err());
    }

    #[test]
    fn test_parse_counter_rejects_garbage_and_zero() {
        assert_eq!(parse_counter("k", " 12 ").expect("should parse"), 12);
        assert!(matches!(
            parse_counter("k", "abc"),
            Err(ClinicError::CorruptCounter { .. })
        ));
        assert!(matches!(
            parse_counter("k", "0"),
            Err(ClinicError::CorruptCounter { .. })
        ));
    }
}
