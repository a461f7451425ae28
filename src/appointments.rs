//! Appointment ingestion pipeline: header normalization, row mapping,
//! day filtering and grouping by salesperson.
//!
//! Every step is pure and total. Malformed input is dropped, never raised.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::models::{Appointment, GroupedAppointments};

/// Canonical appointment attribute a sheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentField {
    Id,
    LeadDate,
    SalesOwner,
    Contact,
    AppointmentDate,
    AppointmentTime,
    CampaignName,
    CompanyName,
    AppointmentPhase,
    TransactionPhase,
    Price,
}

impl AppointmentField {
    /// Looks up a normalized header key. Unknown keys map to nothing.
    pub fn from_normalized_key(key: &str) -> Option<Self> {
        let field = match key {
            "id" => Self::Id,
            "datedeprisederdvdulead" => Self::LeadDate,
            "salesms" => Self::SalesOwner,
            "contact" => Self::Contact,
            "datedurdv" => Self::AppointmentDate,
            "heuredurdv" => Self::AppointmentTime,
            // sic: the sheet header is misspelled
            "nomdelacampange" => Self::CampaignName,
            "nomdelentreprise" => Self::CompanyName,
            "phasedurdv" => Self::AppointmentPhase,
            "phasedelatransaction" => Self::TransactionPhase,
            "prixttc" => Self::Price,
            _ => return None,
        };
        Some(field)
    }

    fn slot(self, appointment: &mut Appointment) -> &mut Option<String> {
        match self {
            Self::Id => &mut appointment.id,
            Self::LeadDate => &mut appointment.lead_date,
            Self::SalesOwner => &mut appointment.sales_owner,
            Self::Contact => &mut appointment.contact,
            Self::AppointmentDate => &mut appointment.appointment_date,
            Self::AppointmentTime => &mut appointment.appointment_time,
            Self::CampaignName => &mut appointment.campaign_name,
            Self::CompanyName => &mut appointment.company_name,
            Self::AppointmentPhase => &mut appointment.appointment_phase,
            Self::TransactionPhase => &mut appointment.transaction_phase,
            Self::Price => &mut appointment.price,
        }
    }
}

fn header_noise() -> &'static Regex {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    NOISE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid header regex"))
}

/// Normalizes a raw column header into a canonical lookup key.
///
/// Drops everything outside `[A-Za-z0-9]` (spaces included) and lowercases
/// the rest, so `"Date du RDV"` becomes `"datedurdv"`. Accented letters are
/// dropped, not transliterated.
pub fn normalize_header(raw: &str) -> String {
    header_noise().replace_all(raw, "").to_lowercase()
}

/// Maps one data row onto an [`Appointment`] using the header row.
///
/// Cells are matched by position. A row shorter than the header row leaves
/// the trailing fields absent; cells past the last header are ignored.
pub fn map_row<H: AsRef<str>, C: AsRef<str>>(headers: &[H], row: &[C]) -> Appointment {
    let mut appointment = Appointment::default();

    for (index, header) in headers.iter().enumerate() {
        let key = normalize_header(header.as_ref());
        let Some(field) = AppointmentField::from_normalized_key(&key) else {
            continue;
        };
        if let Some(cell) = row.get(index) {
            *field.slot(&mut appointment) = Some(cell.as_ref().to_string());
        }
    }

    appointment
}

/// Maps a full sheet (header row first) into appointments.
///
/// An empty sheet yields no appointments.
pub fn map_rows(data: &[Vec<String>]) -> Vec<Appointment> {
    let Some((headers, rows)) = data.split_first() else {
        return Vec::new();
    };
    rows.iter()
        .map(|row| map_row(headers.as_slice(), row.as_slice()))
        .collect()
}

/// Parses a `DD/MM/YYYY` cell into a calendar date.
///
/// Returns `None` unless there are exactly three numeric components forming
/// a real date. Surrounding whitespace on each component is tolerated.
pub fn parse_appointment_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('/');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Formats a date the way the sheet writes it.
pub fn format_appointment_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// True when the appointment's date cell parses and equals `day`.
pub fn is_on_day(appointment: &Appointment, day: NaiveDate) -> bool {
    appointment
        .appointment_date
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .and_then(parse_appointment_date)
        .is_some_and(|date| date == day)
}

/// Keeps only the appointments scheduled on `day`, in input order.
pub fn filter_for_day(appointments: Vec<Appointment>, day: NaiveDate) -> Vec<Appointment> {
    appointments
        .into_iter()
        .filter(|appointment| is_on_day(appointment, day))
        .collect()
}

/// Groups appointments by salesperson, skipping rows without an owner.
pub fn group_by_owner(appointments: Vec<Appointment>) -> GroupedAppointments {
    let mut grouped = GroupedAppointments::new();
    let mut skipped = 0usize;

    for appointment in appointments {
        match appointment.sales_owner.clone() {
            Some(owner) if !owner.is_empty() => grouped.push(&owner, appointment),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} appointment(s) without a sales owner", skipped);
    }

    grouped
}

/// Full pipeline over raw sheet data: map, keep `day`, group.
pub fn build_daily_grouping(data: &[Vec<String>], day: NaiveDate) -> GroupedAppointments {
    let appointments = map_rows(data);
    let mapped = appointments.len();
    let todays = filter_for_day(appointments, day);
    tracing::debug!(
        "Mapped {} row(s), {} scheduled on {}",
        mapped,
        todays.len(),
        format_appointment_date(day)
    );
    group_by_owner(todays)
}
