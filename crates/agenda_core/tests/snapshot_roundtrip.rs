use agenda_core::repo::snapshot;
use agenda_core::{Agenda, Appointment, LineIssue, SnapshotError, StoreConfig};
use proptest::prelude::*;
use tempfile::TempDir;

fn setup() -> (TempDir, StoreConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::new(dir.path().join("Agende_testuali"));
    (dir, config)
}

fn lavoro() -> Agenda {
    let mut agenda = Agenda::new("Lavoro");
    agenda
        .add_fields("04-02-1998", "16-00", "80", "Sala Conferenze", "Capo")
        .unwrap();
    agenda
        .add_fields("01-02-1998", "12-30", "0060", "Ufficio", "Luca")
        .unwrap();
    agenda
}

#[test]
fn save_creates_directory_and_writes_records_in_order() {
    let (_dir, config) = setup();
    let mut agenda = lavoro();
    assert!(!agenda.is_persisted());

    let path = agenda.save(&config).unwrap();
    assert_eq!(path, config.snapshot_dir.join("Lavoro.txt"));
    assert!(agenda.is_persisted());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "01-02-1998|12-30|60min|Ufficio|Luca\n04-02-1998|16-00|80min|Sala Conferenze|Capo\n"
    );
}

#[test]
fn save_load_save_is_stable() {
    let (_dir, config) = setup();
    let mut agenda = lavoro();
    let path = agenda.save(&config).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();

    let mut loaded = Agenda::load(&path, &config).unwrap();
    assert!(loaded.report.is_clean());
    assert_eq!(loaded.agenda, agenda);
    assert!(loaded.agenda.is_persisted());

    loaded.agenda.save(&config).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn empty_agenda_round_trips_as_empty_file() {
    let (_dir, config) = setup();
    let mut agenda = Agenda::new("Vuota");
    let path = agenda.save(&config).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

    let loaded = Agenda::load(&path, &config).unwrap();
    assert!(loaded.agenda.is_empty());
    assert_eq!(loaded.report.lines_read, 0);
}

#[test]
fn non_canonical_extension_loads_as_unsaved() {
    let (dir, config) = setup();
    let path = dir.path().join("Extra.csv");
    std::fs::write(&path, "01-02-1998|12-30|60min|Ufficio|Luca\n").unwrap();

    let loaded = Agenda::load(&path, &config).unwrap();
    assert_eq!(loaded.agenda.name(), "Extra");
    assert_eq!(loaded.agenda.len(), 1);
    assert!(!loaded.agenda.is_persisted());
}

#[test]
fn duration_suffix_is_optional_on_load() {
    let (dir, config) = setup();
    let path = dir.path().join("Misto.txt");
    std::fs::write(
        &path,
        "01-02-1998|12-30|60|Ufficio|Luca\n02-02-1998|12-30|0045min|Ufficio|Luca\n",
    )
    .unwrap();

    let loaded = Agenda::load(&path, &config).unwrap();
    assert!(loaded.report.is_clean());
    let durations: Vec<&str> = loaded.agenda.iter().map(Appointment::duration).collect();
    assert_eq!(durations, ["60", "45"]);
}

#[test]
fn malformed_lines_are_reported_not_fatal() {
    let (dir, config) = setup();
    let path = dir.path().join("Rotta.txt");
    std::fs::write(
        &path,
        "01-02-1998|12-30|60min|Ufficio|Luca\n\
         31-02-1998|12-30|60min|Ufficio|Luca\n\
         not a record\n",
    )
    .unwrap();

    let loaded = Agenda::load(&path, &config).unwrap();
    assert_eq!(loaded.agenda.len(), 1);
    assert_eq!(loaded.report.agenda_name, "Rotta");
    assert_eq!(loaded.report.malformed.len(), 2);
    assert!(matches!(
        loaded.report.malformed[0].issue,
        LineIssue::Invalid(_)
    ));
    assert_eq!(loaded.report.malformed[1].line_number, 3);
    assert!(loaded.report.to_string().contains("line 3: `not a record`"));
}

#[test]
fn missing_file_is_an_io_error_with_path() {
    let (dir, config) = setup();
    let path = dir.path().join("Assente.txt");
    let err = Agenda::load(&path, &config).unwrap_err();
    let SnapshotError::Io { path: failed, .. } = &err;
    assert_eq!(failed, &path);
    assert_eq!(err.path(), path.as_path());
}

#[test]
fn failed_save_keeps_agenda_unsaved() {
    let (dir, _config) = setup();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let config = StoreConfig::new(blocker.join("nested"));

    let mut agenda = lavoro();
    assert!(agenda.save(&config).is_err());
    assert!(!agenda.is_persisted());
}

fn record_line() -> impl Strategy<Value = String> {
    (1u32..=28, 1u32..=12, 0u32..24, 0u32..60, 1u32..=9999).prop_map(
        |(day, month, hour, minute, duration)| {
            format!("{day:02}-{month:02}-2022|{hour:02}-{minute:02}|{duration}min|Sala|Luca")
        },
    )
}

proptest! {
    #[test]
    fn prop_decode_encode_decode_is_stable(lines in prop::collection::vec(record_line(), 0..30)) {
        let text: String = lines.iter().map(|line| format!("{line}\n")).collect();
        let first = snapshot::decode("Prop", &text);
        let encoded = snapshot::encode(&first.agenda);
        let second = snapshot::decode("Prop", &encoded);

        prop_assert!(second.report.is_clean());
        prop_assert_eq!(&second.agenda, &first.agenda);
        prop_assert_eq!(snapshot::encode(&second.agenda), encoded);
        prop_assert_eq!(first.agenda.len() + first.report.malformed.len(), lines.len());
    }
}
