//! The database header: a field holder owning the recognized header field types (§3).

use uuid::Uuid;

use crate::field::FieldHolder;

/// Recognized header field type codes.
pub mod field_type {
    pub const VERSION: u8 = 0x00;
    pub const UUID: u8 = 0x01;
    pub const PREFERENCES: u8 = 0x02;
    pub const TREE_DISPLAY_STATUS: u8 = 0x03;
    pub const TIME_LAST_SAVE: u8 = 0x04;
    pub const WHO_SAVED: u8 = 0x05;
    pub const WHAT_SAVED: u8 = 0x06;
    pub const LAST_USER: u8 = 0x07;
    pub const LAST_HOST: u8 = 0x08;
    pub const DB_NAME: u8 = 0x09;
    pub const DB_DESCRIPTION: u8 = 0x0a;
    pub const DB_FILTERS: u8 = 0x0b;
}

/// The database header.
#[derive(Clone, Debug, Default)]
pub struct Header {
    fields: FieldHolder,
}

impl Header {
    /// An empty header with no fields at all — used while a file is being read, before its
    /// fields are populated from the wire.
    pub fn empty() -> Self {
        Header { fields: FieldHolder::new() }
    }

    /// A freshly created header: VERSION and a new UUID are set, as required of any database
    /// that did not come from reading a file.
    pub fn new(version: u16) -> Self {
        let mut header = Self::empty();
        header.set_version(version);
        header.set_uuid(Uuid::new_v4());
        header
    }

    pub fn fields(&self) -> &FieldHolder {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut FieldHolder {
        &mut self.fields
    }

    pub fn version(&self) -> Option<u16> {
        self.fields.get_first(field_type::VERSION).ok().map(|f| f.as_u16())
    }

    pub fn set_version(&mut self, version: u16) {
        self.fields.set_u16(field_type::VERSION, version);
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.fields.get_first(field_type::UUID).ok().map(|f| f.as_uuid())
    }

    pub fn set_uuid(&mut self, id: Uuid) {
        self.fields.set(field_type::UUID, id.as_bytes().to_vec());
    }

    pub fn db_name(&self) -> String {
        self.fields.text_or_default(field_type::DB_NAME)
    }

    pub fn set_db_name(&mut self, name: &str) {
        self.fields.set(field_type::DB_NAME, name.as_bytes().to_vec());
    }

    pub fn db_description(&self) -> String {
        self.fields.text_or_default(field_type::DB_DESCRIPTION)
    }

    pub fn set_db_description(&mut self, description: &str) {
        self.fields.set(field_type::DB_DESCRIPTION, description.as_bytes().to_vec());
    }

    pub fn last_user(&self) -> String {
        self.fields.text_or_default(field_type::LAST_USER)
    }

    pub fn set_last_user(&mut self, user: &str) {
        self.fields.set(field_type::LAST_USER, user.as_bytes().to_vec());
    }

    pub fn last_host(&self) -> String {
        self.fields.text_or_default(field_type::LAST_HOST)
    }

    pub fn set_last_host(&mut self, host: &str) {
        self.fields.set(field_type::LAST_HOST, host.as_bytes().to_vec());
    }

    pub fn time_last_save(&self) -> Option<u32> {
        self.fields.get_first(field_type::TIME_LAST_SAVE).ok().map(|f| f.as_time())
    }

    pub fn set_time_last_save(&mut self, time: u32) {
        self.fields.set_u32(field_type::TIME_LAST_SAVE, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_header_has_version_and_uuid() {
        let header = Header::new(3);
        assert_eq!(header.version(), Some(3));
        assert!(header.uuid().is_some());
    }

    #[test]
    fn optional_fields_default_empty() {
        let header = Header::empty();
        assert_eq!(header.db_name(), "");
        assert_eq!(header.time_last_save(), None);
    }

    #[test]
    fn set_is_idempotent_on_slot() {
        let mut header = Header::new(3);
        let before = header.fields().len();
        header.set_version(4);
        assert_eq!(header.fields().len(), before);
        assert_eq!(header.version(), Some(4));
    }
}
