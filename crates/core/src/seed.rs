//! Demonstration dataset installed when a registry opens with no doctors.

use crate::models::{Doctor, Patient};
use chrono::NaiveDate;
use clinic_types::{DoctorStatus, Gender};

/// Patient counter value after seeding (two patients were created).
pub const SEED_NEXT_PATIENT_ID: u32 = 3;

pub fn demo_doctors() -> Vec<Doctor> {
    vec![
        doctor(
            1,
            "Dr. Ahmad Santoso, Sp.PD",
            "Penyakit Dalam",
            "SIP.123.456.789",
            "081234567890",
        ),
        doctor(2, "Dr. Siti Nurhaliza, Sp.A", "Anak", "SIP.987.654.321", "081987654321"),
        doctor(
            3,
            "Dr. Budi Prasetyo, Sp.OG",
            "Obstetri & Ginekologi",
            "SIP.456.789.123",
            "081456789123",
        ),
    ]
}

pub fn demo_patients() -> Vec<Patient> {
    vec![
        Patient {
            id: 1,
            record_number: "RM001".into(),
            national_id: "3201012345678901".into(),
            name: "Andi Setiawan".into(),
            gender: Gender::Male,
            birthdate: ymd(1985, 5, 15),
            phone: "081234567890".into(),
            address: "Jl. Merdeka No. 123, Jakarta".into(),
        },
        Patient {
            id: 2,
            record_number: "RM002".into(),
            national_id: "3201012345678902".into(),
            name: "Sari Dewi".into(),
            gender: Gender::Female,
            birthdate: ymd(1990, 8, 20),
            phone: "081987654321".into(),
            address: "Jl. Sudirman No. 456, Jakarta".into(),
        },
    ]
}

fn doctor(id: u32, name: &str, specialty: &str, license: &str, phone: &str) -> Doctor {
    Doctor {
        id,
        name: name.into(),
        specialty: specialty.into(),
        license: license.into(),
        phone: phone.into(),
        status: DoctorStatus::Active,
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}
