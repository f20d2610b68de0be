//! The clinic registry.
//!
//! [`ClinicRegistry`] owns the four record collections (patients, doctors, appointments,
//! medical records) and their id counters. It is the only thing that mutates them.
//!
//! ## Persistence contract
//!
//! - **Read all at open**: every key is read once by [`ClinicRegistry::open`]. Missing
//!   collections start empty and missing counters start at 1.
//! - **Write all on mutation**: every mutation rewrites every key, collections first and then
//!   counters. Writes are not atomic across keys. If a write fails part way, the in-memory state
//!   keeps the mutation and the store may hold collections that are ahead of their counters.
//! - **Fail fast on corrupt state**: a value that does not parse aborts `open`.
//!
//! ## Absent ids
//!
//! Updating or deleting an id that does not exist is not an error. Updates return `None`,
//! deletes return `false`, and the collections are left as they were.

use crate::config::ClinicConfig;
use crate::constants::{
    APPOINTMENTS_KEY, DOCTORS_KEY, FIRST_ID, MEDICAL_RECORDS_KEY, NEXT_APPOINTMENT_ID_KEY,
    NEXT_DOCTOR_ID_KEY, NEXT_MEDICAL_RECORD_ID_KEY, NEXT_PATIENT_ID_KEY, PATIENTS_KEY,
};
use crate::error::{ClinicError, ClinicResult};
use crate::ids::{
    format_record_number, max_plus_one, parse_counter, successor, AppointmentId, DoctorId,
    DoctorIdPolicy, MedicalRecordId, PatientId,
};
use crate::models::{
    doctor_name, patient_name, Appointment, AppointmentUpdate, Doctor, DoctorUpdate,
    MedicalRecord, NewAppointment, NewDoctor, NewMedicalRecord, NewPatient, Patient,
    PatientUpdate,
};
use crate::seed;
use crate::store::KeyValueStore;
use chrono::NaiveDate;
use clinic_types::{AppointmentStatus, DoctorStatus, KeyPrefix};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fully namespaced storage keys.
#[derive(Clone, Debug)]
struct StorageKeys {
    patients: String,
    doctors: String,
    appointments: String,
    medical_records: String,
    next_patient_id: String,
    next_appointment_id: String,
    next_medical_record_id: String,
    next_doctor_id: String,
}

impl StorageKeys {
    fn new(prefix: &KeyPrefix) -> Self {
        Self {
            patients: prefix.key(PATIENTS_KEY),
            doctors: prefix.key(DOCTORS_KEY),
            appointments: prefix.key(APPOINTMENTS_KEY),
            medical_records: prefix.key(MEDICAL_RECORDS_KEY),
            next_patient_id: prefix.key(NEXT_PATIENT_ID_KEY),
            next_appointment_id: prefix.key(NEXT_APPOINTMENT_ID_KEY),
            next_medical_record_id: prefix.key(NEXT_MEDICAL_RECORD_ID_KEY),
            next_doctor_id: prefix.key(NEXT_DOCTOR_ID_KEY),
        }
    }
}

/// Headline numbers for the front page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_patients: usize,
    pub active_doctors: usize,
    pub appointments_today: usize,
    pub waiting_appointments: usize,
}

/// In-memory clinic state with write-through persistence to `S`.
#[derive(Debug)]
pub struct ClinicRegistry<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
    doctor_id_policy: DoctorIdPolicy,
    patients: Vec<Patient>,
    doctors: Vec<Doctor>,
    appointments: Vec<Appointment>,
    medical_records: Vec<MedicalRecord>,
    next_patient_id: PatientId,
    next_appointment_id: AppointmentId,
    next_medical_record_id: MedicalRecordId,
    // Only consulted and persisted under `DoctorIdPolicy::Counter`.
    next_doctor_id: DoctorId,
}

impl<S: KeyValueStore> ClinicRegistry<S> {
    /// Loads the registry from `store`.
    ///
    /// If the doctor list is empty and `cfg.seed_demo_data()` is set, doctors and patients are
    /// replaced with the demonstration dataset and the result is flushed immediately.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::CorruptState` / `ClinicError::CorruptCounter` if a stored value
    /// cannot be parsed, `ClinicError::CounterExhausted` if a loaded doctor already holds the
    /// largest possible id, or a storage error if the store cannot be read or the seed flush fails.
    pub fn open(store: S, cfg: &ClinicConfig) -> ClinicResult<Self> {
        let keys = StorageKeys::new(cfg.key_prefix());

        let patients = load_list(&store, &keys.patients)?;
        let doctors: Vec<Doctor> = load_list(&store, &keys.doctors)?;
        let appointments = load_list(&store, &keys.appointments)?;
        let medical_records = load_list(&store, &keys.medical_records)?;
        let next_patient_id = load_counter(&store, &keys.next_patient_id)?;
        let next_appointment_id = load_counter(&store, &keys.next_appointment_id)?;
        let next_medical_record_id = load_counter(&store, &keys.next_medical_record_id)?;

        // Never hand out an id at or below one already in the list, even if the stored counter
        // predates a policy switch.
        let next_doctor_id = match store.get(&keys.next_doctor_id)? {
            Some(raw) => parse_counter(&keys.next_doctor_id, &raw)?,
            None => FIRST_ID,
        }
        .max(max_plus_one(&keys.doctors, doctors.iter().map(|d| d.id))?);

        let mut registry = Self {
            store,
            keys,
            doctor_id_policy: cfg.doctor_id_policy(),
            patients,
            doctors,
            appointments,
            medical_records,
            next_patient_id,
            next_appointment_id,
            next_medical_record_id,
            next_doctor_id,
        };

        tracing::debug!(
            patients = registry.patients.len(),
            doctors = registry.doctors.len(),
            appointments = registry.appointments.len(),
            medical_records = registry.medical_records.len(),
            "loaded clinic state"
        );

        if registry.doctors.is_empty() && cfg.seed_demo_data() {
            registry.seed_demo_data()?;
        }

        Ok(registry)
    }

    fn seed_demo_data(&mut self) -> ClinicResult<()> {
        if !self.patients.is_empty() {
            tracing::warn!(
                patients = self.patients.len(),
                "doctor list is empty; replacing existing patients with the demonstration dataset"
            );
        }
        self.doctors = seed::demo_doctors();
        self.patients = seed::demo_patients();
        self.next_patient_id = seed::SEED_NEXT_PATIENT_ID;
        self.next_doctor_id =
            max_plus_one(&self.keys.doctors, self.doctors.iter().map(|d| d.id))?;
        tracing::info!("seeded demonstration doctors and patients");
        self.flush()
    }

    /// Rewrites every key in the store from the in-memory state.
    fn flush(&mut self) -> ClinicResult<()> {
        let mut writes = vec![
            (self.keys.patients.clone(), to_json(&self.patients)?),
            (self.keys.doctors.clone(), to_json(&self.doctors)?),
            (self.keys.appointments.clone(), to_json(&self.appointments)?),
            (self.keys.medical_records.clone(), to_json(&self.medical_records)?),
            (
                self.keys.next_patient_id.clone(),
                self.next_patient_id.to_string(),
            ),
            (
                self.keys.next_appointment_id.clone(),
                self.next_appointment_id.to_string(),
            ),
            (
                self.keys.next_medical_record_id.clone(),
                self.next_medical_record_id.to_string(),
            ),
        ];
        if self.doctor_id_policy == DoctorIdPolicy::Counter {
            writes.push((
                self.keys.next_doctor_id.clone(),
                self.next_doctor_id.to_string(),
            ));
        }

        for (key, value) in &writes {
            self.store.set(key, value)?;
        }
        tracing::debug!(keys = writes.len(), "flushed clinic state");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------------

    /// All patients in registration order.
    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    /// All doctors, active or not.
    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    /// All appointments in booking order.
    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    /// Every patient's history, oldest entry first.
    pub fn medical_records(&self) -> &[MedicalRecord] {
        &self.medical_records
    }

    /// Looks up a patient by id.
    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    /// Looks up a doctor by id.
    pub fn doctor(&self, id: DoctorId) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    /// Looks up an appointment by id.
    pub fn appointment(&self, id: AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    /// Patient name, or `Unknown` for a dangling reference.
    pub fn patient_name(&self, id: PatientId) -> &str {
        patient_name(&self.patients, id)
    }

    /// Doctor name, or `Unknown` for a dangling reference.
    pub fn doctor_name(&self, id: DoctorId) -> &str {
        doctor_name(&self.doctors, id)
    }

    /// Id the next patient will receive.
    pub fn next_patient_id(&self) -> PatientId {
        self.next_patient_id
    }

    /// Id the next appointment will receive.
    pub fn next_appointment_id(&self) -> AppointmentId {
        self.next_appointment_id
    }

    /// Id the next medical record will receive.
    pub fn next_medical_record_id(&self) -> MedicalRecordId {
        self.next_medical_record_id
    }

    /// How new doctor ids are chosen.
    pub fn doctor_id_policy(&self) -> DoctorIdPolicy {
        self.doctor_id_policy
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the registry and hands back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    // ------------------------------------------------------------------------
    // Patients
    // ------------------------------------------------------------------------

    /// The record number the next [`add_patient`](Self::add_patient) would generate.
    pub fn next_record_number(&self) -> String {
        format_record_number(self.next_patient_id)
    }

    /// Adds a patient, assigning the next id.
    ///
    /// A missing or blank record number is generated from the counter value the patient
    /// receives as its id (`RM003` for id 3). National ids are not checked for duplicates.
    pub fn add_patient(&mut self, new: NewPatient) -> ClinicResult<Patient> {
        let id = self.next_patient_id;
        let next_id = successor(&self.keys.next_patient_id, id)?;
        let record_number = new
            .record_number
            .filter(|rm| !rm.trim().is_empty())
            .unwrap_or_else(|| format_record_number(id));
        self.next_patient_id = next_id;

        let patient = Patient {
            id,
            record_number,
            national_id: new.national_id,
            name: new.name,
            gender: new.gender,
            birthdate: new.birthdate,
            phone: new.phone,
            address: new.address,
        };
        self.patients.push(patient.clone());
        self.flush()?;
        Ok(patient)
    }

    /// Merges `update` into the patient with `id`. Returns the updated patient, or `None` if
    /// there is no such patient.
    pub fn update_patient(
        &mut self,
        id: PatientId,
        update: PatientUpdate,
    ) -> ClinicResult<Option<Patient>> {
        let updated = self.patients.iter_mut().find(|p| p.id == id).map(|p| {
            update.apply_to(p);
            p.clone()
        });
        if updated.is_none() {
            tracing::debug!(id, "update ignored: no such patient");
        }
        self.flush()?;
        Ok(updated)
    }

    /// Removes the patient with `id`. Appointments and medical records that reference it are
    /// left in place.
    pub fn delete_patient(&mut self, id: PatientId) -> ClinicResult<bool> {
        let before = self.patients.len();
        self.patients.retain(|p| p.id != id);
        let removed = self.patients.len() != before;
        self.flush()?;
        Ok(removed)
    }

    /// Search by name or record number (case-insensitive) or national id.
    ///
    /// The term is lowercased before matching the national id as well, which only matters for
    /// national ids containing letters. An empty term matches every patient.
    pub fn patients_matching(&self, term: &str) -> Vec<&Patient> {
        let term = term.to_lowercase();
        self.patients
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&term)
                    || p.record_number.to_lowercase().contains(&term)
                    || p.national_id.contains(&term)
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Doctors
    // ------------------------------------------------------------------------

    fn allocate_doctor_id(&mut self) -> ClinicResult<DoctorId> {
        match self.doctor_id_policy {
            DoctorIdPolicy::MaxPlusOne => {
                max_plus_one(&self.keys.doctors, self.doctors.iter().map(|d| d.id))
            }
            DoctorIdPolicy::Counter => {
                let id = self.next_doctor_id;
                self.next_doctor_id = successor(&self.keys.next_doctor_id, id)?;
                Ok(id)
            }
        }
    }

    /// Adds a doctor with an id chosen by the configured [`DoctorIdPolicy`].
    pub fn add_doctor(&mut self, new: NewDoctor) -> ClinicResult<Doctor> {
        let doctor = Doctor {
            id: self.allocate_doctor_id()?,
            name: new.name,
            specialty: new.specialty,
            license: new.license,
            phone: new.phone,
            status: new.status,
        };
        self.doctors.push(doctor.clone());
        self.flush()?;
        Ok(doctor)
    }

    /// Merges `update` into the doctor with `id`. Returns `None` if there is no such doctor.
    pub fn update_doctor(
        &mut self,
        id: DoctorId,
        update: DoctorUpdate,
    ) -> ClinicResult<Option<Doctor>> {
        let updated = self.doctors.iter_mut().find(|d| d.id == id).map(|d| {
            update.apply_to(d);
            d.clone()
        });
        if updated.is_none() {
            tracing::debug!(id, "update ignored: no such doctor");
        }
        self.flush()?;
        Ok(updated)
    }

    /// Removes the doctor with `id`. Appointments and medical records that reference it are
    /// left in place and resolve to `Unknown`.
    pub fn delete_doctor(&mut self, id: DoctorId) -> ClinicResult<bool> {
        let before = self.doctors.len();
        self.doctors.retain(|d| d.id != id);
        let removed = self.doctors.len() != before;
        self.flush()?;
        Ok(removed)
    }

    /// Doctors that can be booked.
    pub fn active_doctors(&self) -> Vec<&Doctor> {
        self.doctors
            .iter()
            .filter(|d| d.status == DoctorStatus::Active)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Appointments
    // ------------------------------------------------------------------------

    /// Books an appointment. The status is always `waiting`; patient and doctor ids are stored
    /// as given.
    pub fn add_appointment(&mut self, new: NewAppointment) -> ClinicResult<Appointment> {
        let next_id = successor(&self.keys.next_appointment_id, self.next_appointment_id)?;
        let appointment = Appointment {
            id: self.next_appointment_id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            date: new.date,
            time: new.time,
            complaint: new.complaint,
            status: AppointmentStatus::Waiting,
        };
        self.next_appointment_id = next_id;
        self.appointments.push(appointment.clone());
        self.flush()?;
        Ok(appointment)
    }

    /// Edits the booking details of an appointment. The status is kept as it is.
    pub fn update_appointment(
        &mut self,
        id: AppointmentId,
        update: AppointmentUpdate,
    ) -> ClinicResult<Option<Appointment>> {
        let updated = self.appointments.iter_mut().find(|a| a.id == id).map(|a| {
            update.apply_to(a);
            a.clone()
        });
        if updated.is_none() {
            tracing::debug!(id, "update ignored: no such appointment");
        }
        self.flush()?;
        Ok(updated)
    }

    /// Overwrites the status of an appointment. Returns `false`, without flushing, if there is
    /// no such appointment.
    pub fn set_appointment_status(
        &mut self,
        id: AppointmentId,
        status: AppointmentStatus,
    ) -> ClinicResult<bool> {
        let Some(appointment) = self.appointments.iter_mut().find(|a| a.id == id) else {
            tracing::debug!(id, "status change ignored: no such appointment");
            return Ok(false);
        };
        appointment.status = status;
        self.flush()?;
        Ok(true)
    }

    /// Removes the appointment with `id`. Returns `false` if there was none.
    pub fn delete_appointment(&mut self, id: AppointmentId) -> ClinicResult<bool> {
        let before = self.appointments.len();
        self.appointments.retain(|a| a.id != id);
        let removed = self.appointments.len() != before;
        self.flush()?;
        Ok(removed)
    }

    /// Appointments dated `date`.
    pub fn appointments_on(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.appointments.iter().filter(|a| a.date == date).collect()
    }

    /// Appointments dated within `from..=to`.
    pub fn appointments_in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|a| (from..=to).contains(&a.date))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Medical records
    // ------------------------------------------------------------------------

    /// Appends a medical record. Records are never edited or removed.
    pub fn add_medical_record(&mut self, new: NewMedicalRecord) -> ClinicResult<MedicalRecord> {
        let next_id = successor(&self.keys.next_medical_record_id, self.next_medical_record_id)?;
        let record = MedicalRecord {
            id: self.next_medical_record_id,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            recorded_at: new.recorded_at,
            complaint: new.complaint,
            examination: new.examination,
            diagnosis: new.diagnosis,
            therapy: new.therapy,
            notes: new.notes,
        };
        self.next_medical_record_id = next_id;
        self.medical_records.push(record.clone());
        self.flush()?;
        Ok(record)
    }

    /// A patient's history in the order it was written, oldest first.
    pub fn medical_records_for_patient(&self, patient_id: PatientId) -> Vec<&MedicalRecord> {
        self.medical_records
            .iter()
            .filter(|r| r.patient_id == patient_id)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Dashboard
    // ------------------------------------------------------------------------

    /// Headline counts, with `today` deciding which appointments are today's.
    pub fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        DashboardSummary {
            total_patients: self.patients.len(),
            active_doctors: self.active_doctors().len(),
            appointments_today: self.appointments_on(today).len(),
            waiting_appointments: self
                .appointments
                .iter()
                .filter(|a| a.status == AppointmentStatus::Waiting)
                .count(),
        }
    }
}

fn load_list<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> ClinicResult<Vec<T>> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| ClinicError::CorruptState {
            key: key.to_string(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

fn load_counter(store: &impl KeyValueStore, key: &str) -> ClinicResult<u32> {
    match store.get(key)? {
        Some(raw) => parse_counter(key, &raw),
        None => Ok(FIRST_ID),
    }
}

fn to_json<T: Serialize>(value: &T) -> ClinicResult<String> {
    serde_json::to_string(value).map_err(ClinicError::Serialization)
}
