//! A single credential entry: a field holder owning the recognized record field types (§3).

use uuid::Uuid;

use crate::field::FieldHolder;

/// Recognized record field type codes.
pub mod field_type {
    pub const UUID: u8 = 0x01;
    pub const GROUP: u8 = 0x02;
    pub const TITLE: u8 = 0x03;
    pub const USERNAME: u8 = 0x04;
    pub const NOTES: u8 = 0x05;
    pub const PASSWORD: u8 = 0x06;
    pub const CREATION_TIME: u8 = 0x07;
    pub const PASS_MODIFICATION_TIME: u8 = 0x08;
    pub const LAST_ACCESS_TIME: u8 = 0x09;
    pub const PASS_EXPIRY_TIME: u8 = 0x0a;
    pub const LAST_MODIFICATION_TIME: u8 = 0x0c;
    pub const URL: u8 = 0x0d;
    pub const AUTOTYPE: u8 = 0x0e;
    pub const PASS_HISTORY: u8 = 0x0f;
    pub const PASS_POLICY: u8 = 0x10;
    pub const PASS_EXPIRY_INTERVAL: u8 = 0x11;
}

/// One stored credential.
#[derive(Clone, Debug, Default)]
pub struct Record {
    fields: FieldHolder,
}

impl Record {
    /// A record with no fields yet, populated by the reader while parsing the wire stream.
    pub fn empty() -> Self {
        Record { fields: FieldHolder::new() }
    }

    /// A freshly created record: UUID, TITLE, and PASSWORD are set, as the spec requires of any
    /// record that did not come from reading a file.
    pub fn new(title: &str, password: &str) -> Self {
        let mut record = Self::empty();
        record.fields.add_uuid(field_type::UUID, Uuid::new_v4());
        record.fields.add(field_type::TITLE, title.as_bytes().to_vec());
        record.fields.add(field_type::PASSWORD, password.as_bytes().to_vec());
        record
    }

    pub fn fields(&self) -> &FieldHolder {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldHolder {
        &mut self.fields
    }

    /// The record's identity. `None` only for a record read from a malformed file that omitted
    /// its mandatory UUID field — the reader rejects such a file before returning it.
    pub fn id(&self) -> Option<Uuid> {
        self.fields.get_first(field_type::UUID).ok().map(|f| f.as_uuid())
    }

    pub fn set_id(&mut self, id: Uuid) {
        self.fields.set(field_type::UUID, id.as_bytes().to_vec());
    }

    pub fn group(&self) -> String {
        self.fields.text_or_default(field_type::GROUP)
    }

    pub fn set_group(&mut self, group: &str) {
        self.fields.set(field_type::GROUP, group.as_bytes().to_vec());
    }

    pub fn title(&self) -> String {
        self.fields.text_or_default(field_type::TITLE)
    }

    pub fn set_title(&mut self, title: &str) {
        self.fields.set(field_type::TITLE, title.as_bytes().to_vec());
    }

    pub fn username(&self) -> String {
        self.fields.text_or_default(field_type::USERNAME)
    }

    pub fn set_username(&mut self, username: &str) {
        self.fields.set(field_type::USERNAME, username.as_bytes().to_vec());
    }

    pub fn notes(&self) -> String {
        self.fields.text_or_default(field_type::NOTES)
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.fields.set(field_type::NOTES, notes.as_bytes().to_vec());
    }

    pub fn password(&self) -> String {
        self.fields.text_or_default(field_type::PASSWORD)
    }

    pub fn set_password(&mut self, password: &str) {
        self.fields.set(field_type::PASSWORD, password.as_bytes().to_vec());
    }

    pub fn url(&self) -> String {
        self.fields.text_or_default(field_type::URL)
    }

    pub fn set_url(&mut self, url: &str) {
        self.fields.set(field_type::URL, url.as_bytes().to_vec());
    }

    pub fn creation_time(&self) -> Option<u32> {
        self.fields.get_first(field_type::CREATION_TIME).ok().map(|f| f.as_time())
    }

    pub fn set_creation_time(&mut self, time: u32) {
        self.fields.set_u32(field_type::CREATION_TIME, time);
    }

    pub fn last_modification_time(&self) -> Option<u32> {
        self.fields.get_first(field_type::LAST_MODIFICATION_TIME).ok().map(|f| f.as_time())
    }

    pub fn set_last_modification_time(&mut self, time: u32) {
        self.fields.set_u32(field_type::LAST_MODIFICATION_TIME, time);
    }
}
