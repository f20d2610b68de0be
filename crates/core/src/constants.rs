//! Constants used throughout the clinic core crate.
//!
//! Storage key names, defaults and display fallbacks live here so that the registry, the
//! stores and the command line agree on them.

/// Default namespace for persisted keys.
pub const DEFAULT_KEY_PREFIX: &str = clinic_types::KeyPrefix::DEFAULT;

/// Default directory for the file-backed store when no explicit directory is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Key name (before prefixing) of the serialized patient list.
pub const PATIENTS_KEY: &str = "patients";
/// Key name of the serialized doctor list.
pub const DOCTORS_KEY: &str = "doctors";
/// Key name of the serialized appointment list.
pub const APPOINTMENTS_KEY: &str = "appointments";
/// Key name of the serialized medical record list.
pub const MEDICAL_RECORDS_KEY: &str = "medical_records";

pub const NEXT_PATIENT_ID_KEY: &str = "next_patient_id";
pub const NEXT_APPOINTMENT_ID_KEY: &str = "next_appointment_id";
pub const NEXT_MEDICAL_RECORD_ID_KEY: &str = "next_medical_record_id";
/// Only written when doctors use the counter id policy.
pub const NEXT_DOCTOR_ID_KEY: &str = "next_doctor_id";

/// Starting value of every monotonic counter.
pub const FIRST_ID: u32 = 1;

/// Tag prepended to generated patient record numbers.
pub const RECORD_NUMBER_TAG: &str = "RM";
/// Minimum digit count of generated record numbers (zero padded).
pub const RECORD_NUMBER_WIDTH: usize = 3;

/// Display name for a reference whose target no longer exists.
pub const UNKNOWN_NAME: &str = "Unknown";

/// File extension used by the file-backed store.
pub const STORE_FILE_EXTENSION: &str = "json";
