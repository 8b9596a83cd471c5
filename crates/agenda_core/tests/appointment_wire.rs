use agenda_core::{Appointment, AppointmentFields, FieldKind, TimePoint, ValidationError};
use serde_json::json;

#[test]
fn appointment_serializes_as_raw_record_fields() {
    let appointment = Appointment::new("10-12-2021", "23-30", "0030", "Milano", "Luca").unwrap();
    let value = serde_json::to_value(&appointment).unwrap();
    assert_eq!(
        value,
        json!({
            "date": "10-12-2021",
            "time": "23-30",
            "duration": "30",
            "place": "Milano",
            "person": "Luca"
        })
    );

    let decoded: Appointment = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, appointment);
    assert_eq!(decoded.end().to_string(), "11-12-2021 00-00");
}

#[test]
fn deserialization_revalidates_every_field() {
    let err = serde_json::from_value::<Appointment>(json!({
        "date": "29-02-2023",
        "time": "10-00",
        "duration": "30",
        "place": "Milano",
        "person": "Luca"
    }))
    .unwrap_err();
    assert!(err.to_string().contains("invalid date"));

    let err = serde_json::from_value::<Appointment>(json!({
        "date": "28-02-2023",
        "time": "10-00",
        "duration": "10000",
        "place": "Milano",
        "person": "Luca"
    }))
    .unwrap_err();
    assert!(err.to_string().contains("invalid duration"));

    assert!(serde_json::from_value::<Appointment>(json!({ "date": "28-02-2023" })).is_err());
}

#[test]
fn fields_bundle_converts_both_ways() {
    let fields = AppointmentFields {
        date: "04-02-1998".to_string(),
        time: "16-00".to_string(),
        duration: "80".to_string(),
        place: "Sala Conferenze".to_string(),
        person: "Capo".to_string(),
    };
    let appointment = Appointment::try_from(fields.clone()).unwrap();
    assert_eq!(AppointmentFields::from(appointment), fields);

    let bad = AppointmentFields {
        person: "42".to_string(),
        ..fields
    };
    assert_eq!(
        Appointment::try_from(bad).unwrap_err(),
        ValidationError::new(FieldKind::Person, "42")
    );
}

#[test]
fn time_point_serializes_as_combined_text() {
    let point = TimePoint::parse("01-11-2020", "04-00").unwrap();
    assert_eq!(serde_json::to_value(point).unwrap(), json!("01-11-2020 04-00"));
    assert_eq!(
        serde_json::from_value::<TimePoint>(json!("01-11-2020 04-00")).unwrap(),
        point
    );
    assert!(serde_json::from_value::<TimePoint>(json!("01-11-2020 24-00")).is_err());
}

#[test]
fn field_kind_serializes_in_snake_case() {
    assert_eq!(serde_json::to_value(FieldKind::Duration).unwrap(), json!("duration"));
    assert_eq!(
        serde_json::from_value::<FieldKind>(json!("person")).unwrap(),
        FieldKind::Person
    );
}
