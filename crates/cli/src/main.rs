use anyhow::bail;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use clap::{Parser, Subcommand};
use clinic_core::config::{
    data_dir_from_env_value, doctor_id_policy_from_env_value, flag_from_env_value,
    key_prefix_from_env_value,
};
use clinic_core::{
    Appointment, AppointmentUpdate, ClinicConfig, ClinicRegistry, Doctor, DoctorUpdate, FileStore,
    MedicalRecord, NewAppointment, NewDoctor, NewMedicalRecord, NewPatient, Patient,
    PatientUpdate, Report, ReportKind, ReportRange,
};
use clinic_types::{AppointmentStatus, DoctorStatus, Gender};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Registry = ClinicRegistry<FileStore>;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic registry CLI")]
struct Cli {
    /// Data directory (overrides CLINIC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage patients
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Manage doctors
    #[command(subcommand)]
    Doctors(DoctorCommands),
    /// Manage appointments
    #[command(subcommand)]
    Appointments(AppointmentCommands),
    /// Write medical records
    #[command(subcommand)]
    Records(RecordCommands),
    /// Date-range report: visits, patients or doctors
    Report {
        kind: ReportKind,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day of the range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Today's summary
    Dashboard {
        /// Day to summarise instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List all patients
    List,
    /// Search by name, record number or national id
    Search { term: String },
    /// Register a patient
    Add {
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        name: String,
        /// male or female
        #[arg(long)]
        gender: Gender,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birthdate: NaiveDate,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        address: String,
        /// Record number; generated when omitted
        #[arg(long)]
        record_number: Option<String>,
    },
    /// Edit a patient
    Update {
        id: u32,
        #[arg(long)]
        record_number: Option<String>,
        #[arg(long)]
        national_id: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        gender: Option<Gender>,
        #[arg(long)]
        birthdate: Option<NaiveDate>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a patient
    Delete {
        id: u32,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show a patient's medical history
    Records { id: u32 },
}

#[derive(Subcommand)]
enum DoctorCommands {
    /// List doctors
    List {
        /// Only doctors accepting appointments
        #[arg(long)]
        active: bool,
    },
    /// Register a doctor
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        specialty: String,
        /// Practice licence number
        #[arg(long)]
        license: String,
        #[arg(long)]
        phone: String,
        /// active or inactive
        #[arg(long, default_value = "active")]
        status: DoctorStatus,
    },
    /// Edit a doctor
    Update {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long)]
        license: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        status: Option<DoctorStatus>,
    },
    /// Delete a doctor
    Delete {
        id: u32,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AppointmentCommands {
    /// List appointments, optionally for one day or an inclusive range
    List {
        #[arg(long, conflicts_with_all = ["from", "to"])]
        date: Option<NaiveDate>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Book an appointment
    Add {
        #[arg(long)]
        patient: u32,
        #[arg(long)]
        doctor: u32,
        /// Day of the visit (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Time of the visit (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        #[arg(long)]
        complaint: Option<String>,
    },
    /// Edit an appointment; its status is kept
    Update {
        id: u32,
        #[arg(long)]
        patient: Option<u32>,
        #[arg(long)]
        doctor: Option<u32>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long)]
        complaint: Option<String>,
    },
    /// Set status: waiting, in-progress, completed or cancelled
    Status { id: u32, status: AppointmentStatus },
    /// Delete an appointment
    Delete {
        id: u32,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// Add a visit to a patient's history
    Add {
        #[arg(long)]
        patient: u32,
        #[arg(long)]
        doctor: u32,
        /// Visit time (YYYY-MM-DDTHH:MM); defaults to now
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,
        #[arg(long)]
        complaint: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        examination: Option<String>,
        #[arg(long)]
        therapy: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M")
}

/// Resolve configuration once at startup. Flags win over environment variables.
fn resolve_config(data_dir: Option<PathBuf>) -> anyhow::Result<ClinicConfig> {
    let data_dir =
        data_dir.unwrap_or_else(|| data_dir_from_env_value(env::var("CLINIC_DATA_DIR").ok()));
    let key_prefix = key_prefix_from_env_value(env::var("CLINIC_KEY_PREFIX").ok())?;
    let policy = doctor_id_policy_from_env_value(env::var("CLINIC_DOCTOR_IDS").ok())?;
    let seed = flag_from_env_value(env::var("CLINIC_SEED_DEMO").ok(), true)?;
    Ok(ClinicConfig::new(data_dir, key_prefix, policy, seed))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };

    let cfg = resolve_config(cli.data_dir)?;
    tracing::debug!(data_dir = %cfg.data_dir().display(), "opening clinic registry");
    let store = FileStore::open(cfg.data_dir())?;
    let mut registry = ClinicRegistry::open(store, &cfg)?;

    match command {
        Commands::Patients(command) => run_patients(&mut registry, command)?,
        Commands::Doctors(command) => run_doctors(&mut registry, command)?,
        Commands::Appointments(command) => run_appointments(&mut registry, command)?,
        Commands::Records(command) => run_records(&mut registry, command)?,
        Commands::Report { kind, from, to } => {
            let range = ReportRange::new(from, to)?;
            print_report(&registry.generate_report(kind, range));
        }
        Commands::Dashboard { today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let summary = registry.dashboard(today);
            println!("Dashboard for {today}");
            println!("  Total patients:       {}", summary.total_patients);
            println!("  Active doctors:       {}", summary.active_doctors);
            println!("  Appointments today:   {}", summary.appointments_today);
            println!("  Waiting appointments: {}", summary.waiting_appointments);
        }
    }

    Ok(())
}

fn run_patients(registry: &mut Registry, command: PatientCommands) -> anyhow::Result<()> {
    match command {
        PatientCommands::List => {
            let patients = registry.patients();
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                print_patient(patient);
            }
            println!("Next record number: {}", registry.next_record_number());
        }
        PatientCommands::Search { term } => {
            let found = registry.patients_matching(&term);
            if found.is_empty() {
                println!("No patients match '{term}'.");
            }
            for patient in found {
                print_patient(patient);
            }
        }
        PatientCommands::Add {
            national_id,
            name,
            gender,
            birthdate,
            phone,
            address,
            record_number,
        } => {
            let patient = registry.add_patient(NewPatient {
                record_number,
                national_id,
                name,
                gender,
                birthdate,
                phone,
                address,
            })?;
            println!(
                "Added patient {} with record number {}",
                patient.id, patient.record_number
            );
        }
        PatientCommands::Update {
            id,
            record_number,
            national_id,
            name,
            gender,
            birthdate,
            phone,
            address,
        } => {
            let update = PatientUpdate {
                record_number,
                national_id,
                name,
                gender,
                birthdate,
                phone,
                address,
            };
            match registry.update_patient(id, update)? {
                Some(patient) => println!("Updated patient {}", patient.id),
                None => println!("No patient with id {id}"),
            }
        }
        PatientCommands::Delete { id, yes } => {
            confirm(yes, "patient", id)?;
            if registry.delete_patient(id)? {
                println!("Deleted patient {id}");
            } else {
                println!("No patient with id {id}");
            }
        }
        PatientCommands::Records { id } => {
            let records = registry.medical_records_for_patient(id);
            println!("Medical history of {}", registry.patient_name(id));
            if records.is_empty() {
                println!("No medical records found.");
            }
            for record in records {
                print_record(registry, record);
            }
        }
    }
    Ok(())
}

fn run_doctors(registry: &mut Registry, command: DoctorCommands) -> anyhow::Result<()> {
    match command {
        DoctorCommands::List { active } => {
            let doctors: Vec<&Doctor> = if active {
                registry.active_doctors()
            } else {
                registry.doctors().iter().collect()
            };
            if doctors.is_empty() {
                println!("No doctors found.");
            }
            for doctor in doctors {
                print_doctor(doctor);
            }
        }
        DoctorCommands::Add {
            name,
            specialty,
            license,
            phone,
            status,
        } => {
            let doctor = registry.add_doctor(NewDoctor {
                name,
                specialty,
                license,
                phone,
                status,
            })?;
            println!("Added doctor {} ({})", doctor.id, doctor.name);
        }
        DoctorCommands::Update {
            id,
            name,
            specialty,
            license,
            phone,
            status,
        } => {
            let update = DoctorUpdate {
                name,
                specialty,
                license,
                phone,
                status,
            };
            match registry.update_doctor(id, update)? {
                Some(doctor) => println!("Updated doctor {}", doctor.id),
                None => println!("No doctor with id {id}"),
            }
        }
        DoctorCommands::Delete { id, yes } => {
            confirm(yes, "doctor", id)?;
            if registry.delete_doctor(id)? {
                println!("Deleted doctor {id}");
            } else {
                println!("No doctor with id {id}");
            }
        }
    }
    Ok(())
}

fn run_appointments(registry: &mut Registry, command: AppointmentCommands) -> anyhow::Result<()> {
    match command {
        AppointmentCommands::List { date, from, to } => {
            let appointments: Vec<&Appointment> = match (date, from, to) {
                (Some(date), _, _) => registry.appointments_on(date),
                (None, Some(from), Some(to)) => registry.appointments_in_range(from, to),
                _ => registry.appointments().iter().collect(),
            };
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            for appointment in appointments {
                print_appointment(registry, appointment);
            }
        }
        AppointmentCommands::Add {
            patient,
            doctor,
            date,
            time,
            complaint,
        } => {
            let appointment = registry.add_appointment(NewAppointment {
                patient_id: patient,
                doctor_id: doctor,
                date,
                time,
                complaint,
            })?;
            println!(
                "Booked appointment {} for {} on {} at {}",
                appointment.id,
                registry.patient_name(appointment.patient_id),
                appointment.date,
                appointment.time.format("%H:%M")
            );
        }
        AppointmentCommands::Update {
            id,
            patient,
            doctor,
            date,
            time,
            complaint,
        } => {
            let update = AppointmentUpdate {
                patient_id: patient,
                doctor_id: doctor,
                date,
                time,
                complaint,
            };
            match registry.update_appointment(id, update)? {
                Some(appointment) => println!("Updated appointment {}", appointment.id),
                None => println!("No appointment with id {id}"),
            }
        }
        AppointmentCommands::Status { id, status } => {
            if registry.set_appointment_status(id, status)? {
                println!("Appointment {id} is now {status}");
            } else {
                println!("No appointment with id {id}");
            }
        }
        AppointmentCommands::Delete { id, yes } => {
            confirm(yes, "appointment", id)?;
            if registry.delete_appointment(id)? {
                println!("Deleted appointment {id}");
            } else {
                println!("No appointment with id {id}");
            }
        }
    }
    Ok(())
}

fn run_records(registry: &mut Registry, command: RecordCommands) -> anyhow::Result<()> {
    match command {
        RecordCommands::Add {
            patient,
            doctor,
            at,
            complaint,
            diagnosis,
            examination,
            therapy,
            notes,
        } => {
            let recorded_at = at.unwrap_or_else(now_to_the_minute);
            let record = registry.add_medical_record(NewMedicalRecord {
                patient_id: patient,
                doctor_id: doctor,
                recorded_at,
                complaint,
                examination,
                diagnosis,
                therapy,
                notes,
            })?;
            println!(
                "Added medical record {} for {}",
                record.id,
                registry.patient_name(record.patient_id)
            );
        }
    }
    Ok(())
}

fn now_to_the_minute() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

fn confirm(yes: bool, what: &str, id: u32) -> anyhow::Result<()> {
    if !yes {
        bail!("refusing to delete {what} {id} without --yes");
    }
    Ok(())
}

fn print_patient(patient: &Patient) {
    println!(
        "{:>4}  {}  {}  {}  {}  {}  {}  {}",
        patient.id,
        patient.record_number,
        patient.national_id,
        patient.name,
        patient.gender,
        patient.birthdate,
        patient.phone,
        patient.address
    );
}

fn print_doctor(doctor: &Doctor) {
    println!(
        "{:>4}  {}  {}  {}  {}  {}",
        doctor.id, doctor.name, doctor.specialty, doctor.license, doctor.phone, doctor.status
    );
}

fn print_appointment(registry: &Registry, appointment: &Appointment) {
    println!(
        "{:>4}  {} {}  {}  {}  {}  {}",
        appointment.id,
        appointment.date,
        appointment.time.format("%H:%M"),
        registry.patient_name(appointment.patient_id),
        registry.doctor_name(appointment.doctor_id),
        appointment.complaint.as_deref().unwrap_or("-"),
        appointment.status
    );
}

fn print_record(registry: &Registry, record: &MedicalRecord) {
    println!(
        "{}  {}",
        record.recorded_at.format("%Y-%m-%d %H:%M"),
        registry.doctor_name(record.doctor_id)
    );
    println!("  Complaint:   {}", record.complaint);
    if let Some(examination) = &record.examination {
        println!("  Examination: {examination}");
    }
    println!("  Diagnosis:   {}", record.diagnosis);
    if let Some(therapy) = &record.therapy {
        println!("  Therapy:     {therapy}");
    }
    if let Some(notes) = &record.notes {
        println!("  Notes:       {notes}");
    }
}

fn print_report(report: &Report) {
    match report {
        Report::Visits(visits) => {
            println!("Completed visits: {}", visits.total);
            for row in &visits.by_doctor {
                println!("  {}: {}", row.doctor_name, row.visits);
            }
        }
        Report::NewPatients(patients) => {
            println!("New patients: {}", patients.len());
            for patient in patients {
                print_patient(patient);
            }
        }
        Report::DoctorActivity(rows) => {
            if rows.is_empty() {
                println!("No completed visits in range.");
            }
            for row in rows {
                println!(
                    "  {}: {} visits, {} patients",
                    row.doctor_name, row.visits, row.unique_patients
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_time_accepts_hours_and_minutes() {
        let time = parse_time("09:30").expect("time should parse");
        assert_eq!(time, NaiveTime::from_hms_opt(9, 30, 0).expect("valid time"));
        assert!(parse_time("9.30").is_err());
    }

    #[test]
    fn test_parse_timestamp_uses_datetime_local_format() {
        let at = parse_timestamp("2024-01-10T14:05").expect("timestamp should parse");
        assert_eq!(at.to_string(), "2024-01-10 14:05:00");
    }

    #[test]
    fn test_report_arguments_parse() {
        let cli = Cli::try_parse_from([
            "clinic",
            "report",
            "doctors",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31",
        ])
        .expect("report arguments should parse");
        match cli.command {
            Some(Commands::Report { kind, from, to }) => {
                assert_eq!(kind, ReportKind::DoctorActivity);
                assert!(from.is_some() && to.is_some());
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = Cli::try_parse_from(["clinic", "appointments", "status", "1", "done"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_delete_requires_confirmation() {
        assert!(confirm(false, "patient", 1).is_err());
        assert!(confirm(true, "patient", 1).is_ok());
    }
}
