//! The TLV field model (§3, §4.3): an immutable typed field and an ordered holder of them.

use uuid::Uuid;

use crate::codec::{read_u16_le, read_u32_le};
use crate::error::FieldNotFound;

/// The wire-only terminator type. Never stored in a [`FieldHolder`].
pub const TERMINATOR: u8 = 0xff;

/// An immutable type/payload pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    field_type: u8,
    data: Vec<u8>,
}

impl Field {
    pub fn new(field_type: u8, data: Vec<u8>) -> Self {
        Field { field_type, data }
    }

    pub fn field_type(&self) -> u8 {
        self.field_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The payload decoded as UTF-8 text, as-is. Invalid sequences are replaced rather than
    /// rejected — the source format does not validate this on write.
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    /// Asserts the payload is at least 2 bytes and reads a little-endian `u16`.
    pub fn as_u16(&self) -> u16 {
        assert!(self.data.len() >= 2, "field {} too short for u16", self.field_type);
        read_u16_le(&self.data)
    }

    /// Asserts the payload is at least 4 bytes and reads a little-endian `u32`.
    pub fn as_u32(&self) -> u32 {
        assert!(self.data.len() >= 4, "field {} too short for u32", self.field_type);
        read_u32_le(&self.data)
    }

    /// Alias for [`Field::as_u32`]: the time fields are POSIX timestamps stored as `u32`.
    pub fn as_time(&self) -> u32 {
        self.as_u32()
    }

    /// Asserts the payload is at least 16 bytes and reads it as a UUID.
    pub fn as_uuid(&self) -> Uuid {
        assert!(self.data.len() >= 16, "field {} too short for a UUID", self.field_type);
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.data[..16]);
        Uuid::from_bytes(bytes)
    }
}

/// An ordered sequence of fields, preserving insertion (and so, on a read file, wire) order.
#[derive(Clone, Debug, Default)]
pub struct FieldHolder {
    fields: Vec<Field>,
}

impl FieldHolder {
    pub fn new() -> Self {
        FieldHolder { fields: Vec::new() }
    }

    pub fn add(&mut self, field_type: u8, data: impl Into<Vec<u8>>) {
        self.fields.push(Field::new(field_type, data.into()));
    }

    pub fn add_u16(&mut self, field_type: u8, value: u16) {
        self.add(field_type, value.to_le_bytes().to_vec());
    }

    pub fn add_u32(&mut self, field_type: u8, value: u32) {
        self.add(field_type, value.to_le_bytes().to_vec());
    }

    pub fn add_uuid(&mut self, field_type: u8, value: Uuid) {
        self.add(field_type, value.as_bytes().to_vec());
    }

    /// Replaces the first field of `field_type` in place, preserving its slot; appends if no
    /// such field exists. Assumes at most one field of this type is present.
    pub fn set(&mut self, field_type: u8, data: impl Into<Vec<u8>>) {
        let data = data.into();
        match self.fields.iter_mut().find(|f| f.field_type == field_type) {
            Some(field) => field.data = data,
            None => self.add(field_type, data),
        }
    }

    pub fn set_u16(&mut self, field_type: u8, value: u16) {
        self.set(field_type, value.to_le_bytes().to_vec());
    }

    pub fn set_u32(&mut self, field_type: u8, value: u32) {
        self.set(field_type, value.to_le_bytes().to_vec());
    }

    /// Removes every field of `field_type`.
    pub fn remove_all(&mut self, field_type: u8) {
        self.fields.retain(|f| f.field_type != field_type);
    }

    pub fn has(&self, field_type: u8) -> bool {
        self.fields.iter().any(|f| f.field_type == field_type)
    }

    pub(crate) fn get_first(&self, field_type: u8) -> Result<&Field, FieldNotFound> {
        self.fields
            .iter()
            .find(|f| f.field_type == field_type)
            .ok_or(FieldNotFound)
    }

    pub fn get(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Looks up a text field, falling back to an empty string when absent. Used by the
    /// convenience accessors on [`crate::header::Header`] and [`crate::record::Record`] for
    /// optional fields.
    pub(crate) fn text_or_default(&self, field_type: u8) -> String {
        self.get_first(field_type).map(Field::as_text).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut holder = FieldHolder::new();
        holder.add(0x01, b"a".to_vec());
        holder.add(0x02, b"b".to_vec());
        holder.add(0x03, b"c".to_vec());

        holder.set(0x02, b"bb".to_vec());

        assert_eq!(holder.len(), 3);
        assert_eq!(holder.get(1).unwrap().as_text(), "bb");
    }

    #[test]
    fn set_appends_when_absent() {
        let mut holder = FieldHolder::new();
        holder.add(0x01, b"a".to_vec());
        holder.set(0x09, b"new".to_vec());

        assert_eq!(holder.len(), 2);
        assert_eq!(holder.get(1).unwrap().field_type(), 0x09);
    }

    #[test]
    fn remove_all_drops_every_occurrence() {
        let mut holder = FieldHolder::new();
        holder.add(0x05, b"one".to_vec());
        holder.add(0x05, b"two".to_vec());
        holder.add(0x06, b"keep".to_vec());

        holder.remove_all(0x05);

        assert_eq!(holder.len(), 1);
        assert!(!holder.has(0x05));
    }

    #[test]
    fn get_first_not_found() {
        let holder = FieldHolder::new();
        assert!(holder.get_first(0x01).is_err());
    }

    #[test]
    fn text_or_default_falls_back() {
        let holder = FieldHolder::new();
        assert_eq!(holder.text_or_default(0x04), "");
    }

    #[test]
    fn typed_views_roundtrip() {
        let mut holder = FieldHolder::new();
        holder.add_u16(0x00, 0x0304);
        holder.add_uuid(0x01, Uuid::from_bytes([9u8; 16]));

        assert_eq!(holder.get(0).unwrap().as_u16(), 0x0304);
        assert_eq!(holder.get(1).unwrap().as_uuid(), Uuid::from_bytes([9u8; 16]));
    }
}
