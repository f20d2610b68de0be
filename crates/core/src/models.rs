//! Clinic record types.
//!
//! Each collection has three shapes:
//! - the stored entity (`Patient`, `Doctor`, ...), which is what gets persisted;
//! - a `New*` input for creation, without the fields the registry assigns itself;
//! - a `*Update` input for shallow merges, where `None` leaves a field untouched.
//!
//! Cross-references (`patient_id`, `doctor_id`) are plain ids. Nothing keeps them valid
//! when the referenced entity is deleted.

use crate::constants::UNKNOWN_NAME;
use crate::ids::{AppointmentId, DoctorId, MedicalRecordId, PatientId};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clinic_types::{AppointmentStatus, DoctorStatus, Gender};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub record_number: String,
    pub national_id: String,
    pub name: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPatient {
    /// Assigned from the patient counter when `None`.
    #[serde(default)]
    pub record_number: Option<String>,
    pub national_id: String,
    pub name: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientUpdate {
    pub record_number: Option<String>,
    pub national_id: Option<String>,
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birthdate: Option<NaiveDate>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl PatientUpdate {
    pub(crate) fn apply_to(self, patient: &mut Patient) {
        merge(&mut patient.record_number, self.record_number);
        merge(&mut patient.national_id, self.national_id);
        merge(&mut patient.name, self.name);
        merge(&mut patient.gender, self.gender);
        merge(&mut patient.birthdate, self.birthdate);
        merge(&mut patient.phone, self.phone);
        merge(&mut patient.address, self.address);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub specialty: String,
    /// Practice licence number.
    pub license: String,
    pub phone: String,
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    pub license: String,
    pub phone: String,
    #[serde(default)]
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoctorUpdate {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub license: Option<String>,
    pub phone: Option<String>,
    pub status: Option<DoctorStatus>,
}

impl DoctorUpdate {
    pub(crate) fn apply_to(self, doctor: &mut Doctor) {
        merge(&mut doctor.name, self.name);
        merge(&mut doctor.specialty, self.specialty);
        merge(&mut doctor.license, self.license);
        merge(&mut doctor.phone, self.phone);
        merge(&mut doctor.status, self.status);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub complaint: Option<String>,
    pub status: AppointmentStatus,
}

/// Input for booking an appointment.
///
/// There is no status here: every appointment opens as waiting. A `status` key in
/// deserialized input is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub complaint: Option<String>,
}

/// Shallow edit of an appointment. Status is deliberately absent; see
/// [`crate::ClinicRegistry::set_appointment_status`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentUpdate {
    pub patient_id: Option<PatientId>,
    pub doctor_id: Option<DoctorId>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// A blank complaint clears the stored one.
    pub complaint: Option<String>,
}

impl AppointmentUpdate {
    pub(crate) fn apply_to(self, appointment: &mut Appointment) {
        merge(&mut appointment.patient_id, self.patient_id);
        merge(&mut appointment.doctor_id, self.doctor_id);
        merge(&mut appointment.date, self.date);
        merge(&mut appointment.time, self.time);
        if let Some(complaint) = self.complaint {
            appointment.complaint = Some(complaint).filter(|c| !c.trim().is_empty());
        }
    }
}

/// One visit entry in a patient's history. Never edited or removed once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub recorded_at: NaiveDateTime,
    pub complaint: String,
    #[serde(default)]
    pub examination: Option<String>,
    pub diagnosis: String,
    #[serde(default)]
    pub therapy: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub recorded_at: NaiveDateTime,
    pub complaint: String,
    #[serde(default)]
    pub examination: Option<String>,
    pub diagnosis: String,
    #[serde(default)]
    pub therapy: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Name of the patient with `id`, or `Unknown`.
pub(crate) fn patient_name(patients: &[Patient], id: PatientId) -> &str {
    patients
        .iter()
        .find(|p| p.id == id)
        .map_or(UNKNOWN_NAME, |p| p.name.as_str())
}

/// Name of the doctor with `id`, or `Unknown`.
pub(crate) fn doctor_name(doctors: &[Doctor], id: DoctorId) -> &str {
    doctors
        .iter()
        .find(|d| d.id == id)
        .map_or(UNKNOWN_NAME, |d| d.name.as_str())
}

fn merge<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}
