/// Property-based tests using proptest
/// Tests invariants of the ingestion pipeline that should hold for all inputs
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use rdv_dashboard::appointments::{
    format_appointment_date, group_by_owner, map_row, normalize_header, parse_appointment_date,
};
use rdv_dashboard::models::Appointment;

// Property: header normalization is total and idempotent
proptest! {
    #[test]
    fn normalize_header_is_idempotent(header in "\\PC*") {
        let once = normalize_header(&header);
        prop_assert_eq!(normalize_header(&once), once.clone());
        prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn normalize_header_ignores_spacing_and_case(
        words in prop::collection::vec("[a-zA-Z]{1,8}", 1..5)
    ) {
        let spaced = words.join(" ");
        let joined = words.concat().to_uppercase();
        prop_assert_eq!(normalize_header(&spaced), normalize_header(&joined));
    }
}

// Property: date parsing never panics and round-trips valid dates
proptest! {
    #[test]
    fn date_parsing_never_panics(raw in "\\PC*") {
        let _ = parse_appointment_date(&raw);
    }

    #[test]
    fn formatted_dates_parse_back(days in 0i64..40_000) {
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
        prop_assert_eq!(parse_appointment_date(&format_appointment_date(date)), Some(date));
    }

    #[test]
    fn unpadded_dates_parse(days in 0i64..40_000) {
        let date = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap() + chrono::Duration::days(days);
        let raw = format!("{}/{}/{}", date.day(), date.month(), date.year());
        prop_assert_eq!(parse_appointment_date(&raw), Some(date));
    }
}

// Property: ragged rows never panic and only fill mapped, present columns
proptest! {
    #[test]
    fn map_row_total_over_ragged_rows(
        row in prop::collection::vec("[a-z0-9]{0,6}", 0..12)
    ) {
        let headers = ["ID", "Unknown", "Sales (MS)", "Contact", "Date du RDV"];
        let appointment = map_row(&headers, row.as_slice());

        prop_assert_eq!(appointment.id.as_ref(), row.first());
        prop_assert_eq!(appointment.sales_owner.as_ref(), row.get(2));
        prop_assert_eq!(appointment.contact.as_ref(), row.get(3));
        prop_assert_eq!(appointment.appointment_date.as_ref(), row.get(4));
        prop_assert_eq!(appointment.price, None);
    }
}

// Property: grouping accounts for every input exactly once
proptest! {
    #[test]
    fn grouping_conserves_appointments(
        owners in prop::collection::vec(
            prop::option::of(prop::sample::select(vec!["Alice", "Bea", "Chris", ""])),
            0..40,
        )
    ) {
        let appointments: Vec<Appointment> = owners
            .iter()
            .enumerate()
            .map(|(i, owner)| Appointment {
                id: Some(i.to_string()),
                sales_owner: owner.map(str::to_string),
                ..Default::default()
            })
            .collect();
        let excluded = owners
            .iter()
            .filter(|o| o.map_or(true, str::is_empty))
            .count();

        let grouped = group_by_owner(appointments);

        prop_assert_eq!(grouped.total() + excluded, owners.len());
        for (_, group) in grouped.iter() {
            let ids: Vec<usize> = group
                .iter()
                .map(|a| a.id.as_deref().unwrap().parse().unwrap())
                .collect();
            let mut sorted = ids.clone();
            sorted.sort_unstable();
            prop_assert_eq!(ids, sorted);
        }
    }
}
