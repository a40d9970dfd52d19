//! Exercises the full open/edit/save/reopen cycle against the public API, the way a caller
//! outside the crate would use it.

use pws3::Database;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn create_edit_save_reopen_cycle() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("safe.psafe3");

    let mut db = Database::create_empty(b"hunter2");
    db.create_record("webmail", "s3cr3t", Some("Personal.Email"));
    db.create_record("vpn", "anothersecret", Some("Work"));
    db.create_group("Archive", None);
    db.save(&path).unwrap();

    let mut reopened = Database::open(&path, b"hunter2").unwrap();
    assert_eq!(reopened.header().version(), Some(3));
    assert_eq!(reopened.all_records().len(), 2);

    let webmail_id = reopened
        .all_records()
        .iter()
        .find(|r| r.title() == "webmail")
        .unwrap()
        .id()
        .unwrap();

    let vpn_id = reopened
        .all_records()
        .iter()
        .find(|r| r.title() == "vpn")
        .unwrap()
        .id()
        .unwrap();

    reopened.delete_record(vpn_id);
    reopened.save(&path).unwrap();

    let final_db = Database::open(&path, b"hunter2").unwrap();
    assert_eq!(final_db.all_records().len(), 1);
    assert_eq!(final_db.all_records()[0].id().unwrap(), webmail_id);
    assert_eq!(final_db.all_records()[0].group(), "Personal.Email");
}

#[test]
fn unknown_field_type_survives_round_trip_verbatim() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("unknown-field.psafe3");

    const UNKNOWN_TYPE: u8 = 0x99;
    const UNKNOWN_PAYLOAD: &[u8] = b"some-future-client-added-this";

    let mut db = Database::create_empty(b"pw");
    let id = db.create_record("mail", "s3cr3t", None).id().unwrap();

    let record = db.record_mut(id).unwrap();
    let position = record.fields().len();
    record.fields_mut().add(UNKNOWN_TYPE, UNKNOWN_PAYLOAD.to_vec());
    db.save(&path).unwrap();

    let reopened = Database::open(&path, b"pw").unwrap();
    let record = reopened.all_records().iter().find(|r| r.id() == Some(id)).unwrap();

    let field = record.fields().get(position).unwrap();
    assert_eq!(field.field_type(), UNKNOWN_TYPE);
    assert_eq!(field.data(), UNKNOWN_PAYLOAD);
}

#[test]
fn group_tree_reflects_record_groups_after_edits() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groups.psafe3");

    let mut db = Database::create_empty(b"pw");
    db.create_record("a", "", Some("Work"));
    db.create_record("b", "", Some("Work.Email"));
    db.create_record("c", "", Some("Work.Chat"));
    db.save(&path).unwrap();

    let reopened = Database::open(&path, b"pw").unwrap();
    assert_eq!(reopened.subgroups("Work").len(), 2);
    assert_eq!(reopened.records("Work").len(), 1);
    assert_eq!(reopened.deep_records("Work").len(), 3);
}

#[test]
fn save_with_new_key_locks_out_the_old_passphrase() {
    init_logging();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rekey.psafe3");

    let mut db = Database::create_empty(b"old-pass");
    db.create_record("site", "pw", None);
    db.save(&path).unwrap();

    db.save_with_new_key(&path, b"new-pass").unwrap();

    assert!(Database::open(&path, b"old-pass").is_err());
    let reopened = Database::open(&path, b"new-pass").unwrap();
    assert_eq!(reopened.all_records().len(), 1);
}
