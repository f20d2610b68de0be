//! # Clinic Core
//!
//! Core business logic for the clinic registry.
//!
//! This crate contains pure data operations over four collections (patients, doctors,
//! appointments and medical records) and their persistence:
//! - CRUD operations with counter-assigned ids and `RMnnn` record numbers
//! - Write-through persistence of the full state to a [`KeyValueStore`] after every mutation
//! - Search, date filters and date-range reports
//! - A demonstration dataset installed on first use
//!
//! **No presentation concerns**: formatting, prompts and command-line parsing belong in the
//! `clinic-cli` crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod models;
pub mod registry;
pub mod reports;
pub mod seed;
pub mod store;

pub use config::ClinicConfig;
pub use error::{ClinicError, ClinicResult};
pub use ids::{
    format_record_number, AppointmentId, DoctorId, DoctorIdPolicy, MedicalRecordId, PatientId,
};
pub use models::{
    Appointment, AppointmentUpdate, Doctor, DoctorUpdate, MedicalRecord, NewAppointment,
    NewDoctor, NewMedicalRecord, NewPatient, Patient, PatientUpdate,
};
pub use registry::{ClinicRegistry, DashboardSummary};
pub use reports::{DoctorActivity, DoctorVisits, Report, ReportKind, ReportRange, VisitsReport};
pub use store::{FileStore, KeyValueStore, MemoryStore};

pub use clinic_types::{AppointmentStatus, DoctorStatus, Gender, KeyPrefix, TypesError};
