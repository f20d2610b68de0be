//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the registry. Core
//! code never reads environment variables itself; the helpers at the bottom of this module turn
//! optional raw values (typically taken from the environment by a binary) into typed settings.

use crate::constants::{DEFAULT_DATA_DIR, DEFAULT_KEY_PREFIX};
use crate::error::{ClinicError, ClinicResult};
use crate::ids::DoctorIdPolicy;
use clinic_types::KeyPrefix;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ClinicConfig {
    data_dir: PathBuf,
    key_prefix: KeyPrefix,
    doctor_id_policy: DoctorIdPolicy,
    seed_demo_data: bool,
}

impl ClinicConfig {
    pub fn new(
        data_dir: PathBuf,
        key_prefix: KeyPrefix,
        doctor_id_policy: DoctorIdPolicy,
        seed_demo_data: bool,
    ) -> Self {
        Self {
            data_dir,
            key_prefix,
            doctor_id_policy,
            seed_demo_data,
        }
    }

    /// Directory used by [`crate::store::FileStore`].
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn key_prefix(&self) -> &KeyPrefix {
        &self.key_prefix
    }

    pub fn doctor_id_policy(&self) -> DoctorIdPolicy {
        self.doctor_id_policy
    }

    /// Whether an empty doctor list is replaced by the demonstration dataset on open.
    pub fn seed_demo_data(&self) -> bool {
        self.seed_demo_data
    }

    pub fn with_doctor_id_policy(mut self, policy: DoctorIdPolicy) -> Self {
        self.doctor_id_policy = policy;
        self
    }

    pub fn with_seed_demo_data(mut self, seed: bool) -> Self {
        self.seed_demo_data = seed;
        self
    }
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            key_prefix: KeyPrefix::default(),
            doctor_id_policy: DoctorIdPolicy::default(),
            seed_demo_data: true,
        }
    }
}

/// Treats `None`, empty and whitespace-only values as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory, falling back to [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the key prefix, falling back to [`DEFAULT_KEY_PREFIX`].
pub fn key_prefix_from_env_value(value: Option<String>) -> ClinicResult<KeyPrefix> {
    let raw = non_blank(value).unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
    Ok(KeyPrefix::new(raw)?)
}

/// Parse the doctor id policy, falling back to [`DoctorIdPolicy::MaxPlusOne`].
pub fn doctor_id_policy_from_env_value(value: Option<String>) -> ClinicResult<DoctorIdPolicy> {
    non_blank(value)
        .map(|v| v.parse::<DoctorIdPolicy>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Parse a boolean switch. Accepts `true/false`, `yes/no`, `on/off` and `1/0`.
pub fn flag_from_env_value(value: Option<String>, default: bool) -> ClinicResult<bool> {
    let Some(raw) = non_blank(value) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ClinicError::InvalidInput(format!(
            "expected a boolean value, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ClinicConfig::default();
        assert_eq!(cfg.data_dir(), Path::new(DEFAULT_DATA_DIR));
        assert_eq!(cfg.key_prefix().as_str(), DEFAULT_KEY_PREFIX);
        assert_eq!(cfg.doctor_id_policy(), DoctorIdPolicy::MaxPlusOne);
        assert!(cfg.seed_demo_data());
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        assert_eq!(
            data_dir_from_env_value(Some("  ".into())),
            PathBuf::from(DEFAULT_DATA_DIR)
        );
        assert_eq!(
            key_prefix_from_env_value(None)
                .expect("default prefix is valid")
                .as_str(),
            DEFAULT_KEY_PREFIX
        );
        assert_eq!(
            doctor_id_policy_from_env_value(Some(String::new())).expect("blank is default"),
            DoctorIdPolicy::MaxPlusOne
        );
        assert!(flag_from_env_value(None, true).expect("unset uses default"));
    }

    #[test]
    fn test_invalid_prefix_is_rejected() {
        let err = key_prefix_from_env_value(Some("bad prefix".into()))
            .expect_err("spaces are not allowed");
        assert!(matches!(err, ClinicError::Types(_)));
    }

    #[test]
    fn test_flag_parsing() {
        assert!(!flag_from_env_value(Some("off".into()), true).expect("off parses"));
        assert!(flag_from_env_value(Some("YES".into()), false).expect("YES parses"));
        assert!(flag_from_env_value(Some("maybe".into()), false).is_err());
    }
}
