//! Date-range reports.
//!
//! Reports are derived on demand from the registry's collections and keep no state. Every
//! report covers an inclusive [`ReportRange`]. Doctors are grouped by their resolved name, so
//! appointments whose doctor was deleted are pooled under `Unknown`, and groups appear in the
//! order their first appointment was filed.

use crate::error::{ClinicError, ClinicResult};
use crate::ids::PatientId;
use crate::models::{doctor_name, Appointment, Doctor, Patient};
use crate::registry::ClinicRegistry;
use crate::store::KeyValueStore;
use chrono::NaiveDate;
use clinic_types::AppointmentStatus;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl ReportRange {
    /// Both ends are required.
    ///
    /// A range whose start is after its end is accepted and simply matches nothing.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ClinicResult<Self> {
        match (from, to) {
            (Some(from), Some(to)) => Ok(Self { from, to }),
            _ => Err(ClinicError::IncompleteRange),
        }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.from..=self.to).contains(&date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Completed visits per doctor.
    Visits,
    /// Patients whose first filed appointment falls in the range.
    NewPatients,
    /// Completed visits and distinct patients per doctor.
    DoctorActivity,
}

impl ReportKind {
    pub fn code(self) -> &'static str {
        match self {
            ReportKind::Visits => "visits",
            ReportKind::NewPatients => "patients",
            ReportKind::DoctorActivity => "doctors",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ReportKind {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visits" => Ok(ReportKind::Visits),
            "patients" => Ok(ReportKind::NewPatients),
            "doctors" => Ok(ReportKind::DoctorActivity),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown report '{other}' (expected visits, patients or doctors)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorVisits {
    pub doctor_name: String,
    pub visits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitsReport {
    pub total: usize,
    pub by_doctor: Vec<DoctorVisits>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoctorActivity {
    pub doctor_name: String,
    pub visits: usize,
    pub unique_patients: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Visits(VisitsReport),
    NewPatients(Vec<Patient>),
    DoctorActivity(Vec<DoctorActivity>),
}

impl Report {
    /// True when the report has no rows to show.
    pub fn is_empty(&self) -> bool {
        match self {
            Report::Visits(report) => report.total == 0,
            Report::NewPatients(patients) => patients.is_empty(),
            Report::DoctorActivity(rows) => rows.is_empty(),
        }
    }
}

fn completed_in<'a>(
    appointments: &'a [Appointment],
    range: ReportRange,
) -> impl Iterator<Item = &'a Appointment> {
    appointments
        .iter()
        .filter(move |a| a.status == AppointmentStatus::Completed && range.contains(a.date))
}

pub fn visits_by_doctor(
    appointments: &[Appointment],
    doctors: &[Doctor],
    range: ReportRange,
) -> VisitsReport {
    let mut by_doctor: Vec<DoctorVisits> = Vec::new();
    let mut total = 0;
    for appointment in completed_in(appointments, range) {
        total += 1;
        let name = doctor_name(doctors, appointment.doctor_id);
        match by_doctor.iter_mut().find(|row| row.doctor_name == name) {
            Some(row) => row.visits += 1,
            None => by_doctor.push(DoctorVisits {
                doctor_name: name.to_string(),
                visits: 1,
            }),
        }
    }
    VisitsReport { total, by_doctor }
}

/// Patients whose first appointment, in filing order rather than by date, is dated within
/// `range`.
///
/// Filing order is used as a stand-in for a registration date. A patient whose earliest-dated
/// appointment was filed after a later-dated one is classified by the later one.
pub fn new_patients(
    patients: &[Patient],
    appointments: &[Appointment],
    range: ReportRange,
) -> Vec<Patient> {
    patients
        .iter()
        .filter(|p| {
            appointments
                .iter()
                .find(|a| a.patient_id == p.id)
                .is_some_and(|first| range.contains(first.date))
        })
        .cloned()
        .collect()
}

pub fn doctor_activity(
    appointments: &[Appointment],
    doctors: &[Doctor],
    range: ReportRange,
) -> Vec<DoctorActivity> {
    let mut rows: Vec<(String, usize, HashSet<PatientId>)> = Vec::new();
    for appointment in completed_in(appointments, range) {
        let name = doctor_name(doctors, appointment.doctor_id);
        let index = match rows.iter().position(|(n, _, _)| n == name) {
            Some(index) => index,
            None => {
                rows.push((name.to_string(), 0, HashSet::new()));
                rows.len() - 1
            }
        };
        let (_, visits, patients) = &mut rows[index];
        *visits += 1;
        patients.insert(appointment.patient_id);
    }

    rows.into_iter()
        .map(|(doctor_name, visits, patients)| DoctorActivity {
            doctor_name,
            visits,
            unique_patients: patients.len(),
        })
        .collect()
}

impl<S: KeyValueStore> ClinicRegistry<S> {
    pub fn generate_report(&self, kind: ReportKind, range: ReportRange) -> Report {
        match kind {
            ReportKind::Visits => {
                Report::Visits(visits_by_doctor(self.appointments(), self.doctors(), range))
            }
            ReportKind::NewPatients => {
                Report::NewPatients(new_patients(self.patients(), self.appointments(), range))
            }
            ReportKind::DoctorActivity => Report::DoctorActivity(doctor_activity(
                self.appointments(),
                self.doctors(),
                range,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClinicConfig;
    use crate::models::NewAppointment;
    use crate::store::MemoryStore;
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test date should parse")
    }

    fn january() -> ReportRange {
        ReportRange::new(Some(date("2024-01-01")), Some(date("2024-01-31")))
            .expect("range should be complete")
    }

    fn registry() -> ClinicRegistry<MemoryStore> {
        ClinicRegistry::open(MemoryStore::new(), &ClinicConfig::default())
            .expect("open should succeed")
    }

    fn book(
        registry: &mut ClinicRegistry<MemoryStore>,
        patient_id: u32,
        doctor_id: u32,
        on: &str,
        status: AppointmentStatus,
    ) {
        let appointment = registry
            .add_appointment(NewAppointment {
                patient_id,
                doctor_id,
                date: date(on),
                time: NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
                complaint: None,
            })
            .expect("add should succeed");
        registry
            .set_appointment_status(appointment.id, status)
            .expect("status change should succeed");
    }

    #[test]
    fn test_range_requires_both_ends() {
        assert!(matches!(
            ReportRange::new(Some(date("2024-01-01")), None),
            Err(ClinicError::IncompleteRange)
        ));
        assert!(matches!(
            ReportRange::new(None, Some(date("2024-01-01"))),
            Err(ClinicError::IncompleteRange)
        ));
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = january();
        assert!(range.contains(date("2024-01-01")));
        assert!(range.contains(date("2024-01-31")));
        assert!(!range.contains(date("2024-02-01")));
    }

    #[test]
    fn test_completed_appointment_counts_once_under_doctor_name() {
        let mut registry = registry();
        book(&mut registry, 1, 1, "2024-01-10", AppointmentStatus::Completed);

        let report = visits_by_doctor(registry.appointments(), registry.doctors(), january());
        assert_eq!(report.total, 1);
        assert_eq!(
            report.by_doctor,
            vec![DoctorVisits {
                doctor_name: "Dr. Ahmad Santoso, Sp.PD".into(),
                visits: 1,
            }]
        );
    }

    #[test]
    fn test_visits_ignore_other_statuses_and_dates() {
        let mut registry = registry();
        book(&mut registry, 1, 1, "2024-01-10", AppointmentStatus::Waiting);
        book(&mut registry, 1, 1, "2024-01-11", AppointmentStatus::Cancelled);
        book(&mut registry, 1, 1, "2024-01-12", AppointmentStatus::InProgress);
        book(&mut registry, 1, 1, "2024-02-01", AppointmentStatus::Completed);

        let report = registry.generate_report(ReportKind::Visits, january());
        assert!(report.is_empty());
    }

    #[test]
    fn test_visits_group_in_first_seen_order_and_pool_unknown_doctors() {
        let mut registry = registry();
        book(&mut registry, 1, 2, "2024-01-03", AppointmentStatus::Completed);
        book(&mut registry, 1, 1, "2024-01-04", AppointmentStatus::Completed);
        book(&mut registry, 2, 2, "2024-01-05", AppointmentStatus::Completed);
        book(&mut registry, 2, 40, "2024-01-06", AppointmentStatus::Completed);
        book(&mut registry, 2, 41, "2024-01-07", AppointmentStatus::Completed);

        let report = visits_by_doctor(registry.appointments(), registry.doctors(), january());
        let rows: Vec<_> = report
            .by_doctor
            .iter()
            .map(|r| (r.doctor_name.as_str(), r.visits))
            .collect();
        assert_eq!(report.total, 5);
        assert_eq!(
            rows,
            vec![
                ("Dr. Siti Nurhaliza, Sp.A", 2),
                ("Dr. Ahmad Santoso, Sp.PD", 1),
                ("Unknown", 2),
            ]
        );
    }

    #[test]
    fn test_new_patients_use_first_filed_appointment() {
        let mut registry = registry();
        // Patient 1: first filed appointment is in December, a later-filed one is earlier still.
        book(&mut registry, 1, 1, "2023-12-20", AppointmentStatus::Waiting);
        book(&mut registry, 1, 1, "2024-01-05", AppointmentStatus::Waiting);
        // Patient 2: first filed appointment is in January even though an earlier one was
        // filed afterwards.
        book(&mut registry, 2, 1, "2024-01-15", AppointmentStatus::Cancelled);
        book(&mut registry, 2, 1, "2023-11-01", AppointmentStatus::Completed);

        let found = new_patients(registry.patients(), registry.appointments(), january());
        let ids: Vec<_> = found.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_new_patients_skip_patients_without_appointments() {
        let registry = registry();
        let report = registry.generate_report(ReportKind::NewPatients, january());
        assert_eq!(report, Report::NewPatients(vec![]));
    }

    #[test]
    fn test_doctor_activity_counts_distinct_patients() {
        let mut registry = registry();
        book(&mut registry, 1, 1, "2024-01-02", AppointmentStatus::Completed);
        book(&mut registry, 1, 1, "2024-01-09", AppointmentStatus::Completed);
        book(&mut registry, 2, 1, "2024-01-16", AppointmentStatus::Completed);
        book(&mut registry, 2, 3, "2024-01-17", AppointmentStatus::Completed);
        book(&mut registry, 2, 3, "2024-01-18", AppointmentStatus::Waiting);

        let rows = doctor_activity(registry.appointments(), registry.doctors(), january());
        assert_eq!(
            rows,
            vec![
                DoctorActivity {
                    doctor_name: "Dr. Ahmad Santoso, Sp.PD".into(),
                    visits: 3,
                    unique_patients: 2,
                },
                DoctorActivity {
                    doctor_name: "Dr. Budi Prasetyo, Sp.OG".into(),
                    visits: 1,
                    unique_patients: 1,
                },
            ]
        );
    }

    #[test]
    fn test_report_kind_parse() {
        assert_eq!(
            "patients".parse::<ReportKind>().expect("should parse"),
            ReportKind::NewPatients
        );
        assert_eq!(
            "Doctors".parse::<ReportKind>().expect("should parse"),
            ReportKind::DoctorActivity
        );
        assert!("revenue".parse::<ReportKind>().is_err());
    }
}
