//! Shared value types for the clinic workspace.
//!
//! These are the small closed vocabularies used by every clinic record (gender, doctor status,
//! appointment status) plus the validated [`KeyPrefix`] that namespaces persisted keys.
//!
//! Each enum has a stable lowercase string code. The code is what gets persisted and what the
//! command line accepts, so it must never change for an existing variant.

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated clinic values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The key prefix was empty or contained only whitespace
    #[error("key prefix cannot be empty")]
    EmptyPrefix,
    /// The key prefix exceeded the maximum length
    #[error("key prefix exceeds maximum length of {0} characters")]
    PrefixTooLong(usize),
    /// The key prefix contained characters outside the allowed set
    #[error("key prefix contains invalid characters (only alphanumeric, '.', '-', '_' allowed)")]
    PrefixInvalidChars,
    /// A string code did not name any variant of the target enum
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownCode {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Namespace prepended to every persisted key (`<prefix>_patients`, ...).
///
/// Guaranteed non-empty, at most [`KeyPrefix::MAX_LEN`] characters, and restricted to ASCII
/// alphanumerics plus `.`, `-` and `_` so that it is safe both as a storage key and as part of
/// a file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    pub const MAX_LEN: usize = 64;
    pub const DEFAULT: &'static str = "rme";

    /// Validates and trims `input` into a `KeyPrefix`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyPrefix);
        }
        if trimmed.len() > Self::MAX_LEN {
            return Err(TypesError::PrefixTooLong(Self::MAX_LEN));
        }
        let ok = trimmed
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'.' | b'-' | b'_'));
        if !ok {
            return Err(TypesError::PrefixInvalidChars);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the namespaced key for `name`.
    pub fn key(&self, name: &str) -> String {
        format!("{}_{}", self.0, name)
    }
}

impl Default for KeyPrefix {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KeyPrefix {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// Implements `code()`, `Display`, `FromStr` and a const list of all variants for a
// string-coded enum.
macro_rules! coded_enum {
    ($ty:ident, $kind:literal, $expected:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            /// Stable string code used for persistence and command-line input.
            pub fn code(self) -> &'static str {
                match self {
                    $($ty::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $ty {
            type Err = TypesError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($code => Ok($ty::$variant),)+
                    _ => Err(TypesError::UnknownCode {
                        kind: $kind,
                        value: s.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

coded_enum!(Gender, "gender", "male, female", {
    Male => "male",
    Female => "female",
});

/// Whether a doctor can currently be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoctorStatus {
    #[default]
    Active,
    Inactive,
}

coded_enum!(DoctorStatus, "doctor status", "active, inactive", {
    Active => "active",
    Inactive => "inactive",
});

/// Lifecycle of an appointment.
///
/// Every appointment opens as [`AppointmentStatus::Waiting`]. Transitions are not
/// restricted: any status may be set from any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    #[default]
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

coded_enum!(
    AppointmentStatus,
    "appointment status",
    "waiting, in-progress, completed, cancelled",
    {
        Waiting => "waiting",
        InProgress => "in-progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix_trims_and_builds_keys() {
        let prefix = KeyPrefix::new("  rme ").expect("prefix should be valid");
        assert_eq!(prefix.as_str(), "rme");
        assert_eq!(prefix.key("patients"), "rme_patients");
    }

    #[test]
    fn test_default_key_prefix_is_valid() {
        let validated = KeyPrefix::new(KeyPrefix::DEFAULT).expect("default should validate");
        assert_eq!(validated, KeyPrefix::default());
    }

    #[test]
    fn test_key_prefix_rejects_empty() {
        assert_eq!(KeyPrefix::new("   "), Err(TypesError::EmptyPrefix));
    }

    #[test]
    fn test_key_prefix_rejects_path_characters() {
        assert_eq!(
            KeyPrefix::new("../etc"),
            Err(TypesError::PrefixInvalidChars)
        );
        assert_eq!(KeyPrefix::new("a b"), Err(TypesError::PrefixInvalidChars));
    }

    #[test]
    fn test_key_prefix_rejects_overlong() {
        let long = "a".repeat(KeyPrefix::MAX_LEN + 1);
        assert_eq!(
            KeyPrefix::new(long),
            Err(TypesError::PrefixTooLong(KeyPrefix::MAX_LEN))
        );
    }

    #[test]
    fn test_appointment_status_codes_match_serde() {
        for status in AppointmentStatus::ALL {
            let json = serde_json::to_string(status).expect("status should serialize");
            assert_eq!(json, format!("\"{}\"", status.code()));
            let parsed: AppointmentStatus = status.code().parse().expect("code should parse");
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("In-Progress".parse::<AppointmentStatus>(), Ok(AppointmentStatus::InProgress));
        assert_eq!("FEMALE".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" inactive ".parse::<DoctorStatus>(), Ok(DoctorStatus::Inactive));
    }

    #[test]
    fn test_parse_unknown_code_reports_expected_values() {
        let err = "done".parse::<AppointmentStatus>().expect_err("should reject");
        let msg = err.to_string();
        assert!(msg.contains("appointment status"));
        assert!(msg.contains("in-progress"));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(AppointmentStatus::default(), AppointmentStatus::Waiting);
        assert_eq!(DoctorStatus::default(), DoctorStatus::Active);
    }
}
