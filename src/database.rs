//! The in-memory database facade (§4.6): the surface most callers use instead of the raw
//! reader/writer pair.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use secrets::SecretVec;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::group::{self, GroupPath, GroupTree};
use crate::header::Header;
use crate::reader;
use crate::record::Record;
use crate::writer::{Writer, DEFAULT_ITERATIONS};

/// A synthetic, field-less group: exists only as long as at least one record lives under it, or
/// until [`Database::create_group`] is called for it directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    path: GroupPath,
}

impl Group {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        group::name_of(&self.path)
    }
}

/// An entity at a given level of the group tree: either a subgroup or a record directly in it.
pub enum Entity<'a> {
    Group(Group),
    Record(&'a Record),
}

/// The in-memory database: a header, an ordered list of records, and a set of synthetic groups
/// that exist even with no records in them yet.
pub struct Database {
    header: Header,
    records: Vec<Record>,
    /// Group paths created via [`Database::create_group`] with no record in them (yet). Once a
    /// record is filed under one, the path also appears via [`GroupTree::build`], so this set
    /// only matters for groups that would otherwise be invisible.
    empty_groups: Vec<GroupPath>,
    passphrase: SecretVec<u8>,
}

fn secret_copy(passphrase: &[u8]) -> SecretVec<u8> {
    let mut secret = SecretVec::zero(passphrase.len());
    secret.borrow_mut().copy_from_slice(passphrase);
    secret
}

impl Database {
    /// A fresh, empty database: new header UUID, VERSION 3, no records.
    pub fn create_empty(passphrase: &[u8]) -> Self {
        Database {
            header: Header::new(3),
            records: Vec::new(),
            empty_groups: Vec::new(),
            passphrase: secret_copy(passphrase),
        }
    }

    /// Opens and authenticates a safe at `path`.
    pub fn open(path: impl AsRef<Path>, passphrase: &[u8]) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::FileNotFound)?;

        match reader::read(file, passphrase) {
            Ok(parsed) => {
                log::debug!("opened password safe at {}", path.display());
                Ok(Database {
                    header: parsed.header,
                    records: parsed.records,
                    empty_groups: Vec::new(),
                    passphrase: secret_copy(passphrase),
                })
            }
            Err(err) => {
                log::warn!("failed to open {}: {err}", path.display());
                Err(err)
            }
        }
    }

    /// Atomically writes the database at `path` with the current in-memory passphrase.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let current = self.passphrase.borrow();
        self.write_to(path, &current[..])
    }

    /// Like [`Database::save`], but under a new passphrase; on success the new passphrase becomes
    /// the current one.
    pub fn save_with_new_key(&mut self, path: impl AsRef<Path>, new_passphrase: &[u8]) -> Result<()> {
        self.write_to(&path, new_passphrase)?;
        self.passphrase = secret_copy(new_passphrase);
        Ok(())
    }

    fn write_to(&self, path: impl AsRef<Path>, passphrase: &[u8]) -> Result<()> {
        let path = path.as_ref();
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));

        let mut tempfile = tempfile::NamedTempFile::new_in(parent).map_err(Error::CannotWriteFile)?;

        let result = (|| -> Result<()> {
            let mut writer = Writer::new(
                BufWriter::new(tempfile.as_file_mut()),
                DEFAULT_ITERATIONS,
                passphrase,
            )?;

            for field in self.header.fields().iter() {
                writer.write_field(field.field_type(), field.data())?;
            }
            writer.write_field(crate::field::TERMINATOR, &[])?;

            for record in &self.records {
                for field in record.fields().iter() {
                    writer.write_field(field.field_type(), field.data())?;
                }
                writer.write_field(crate::field::TERMINATOR, &[])?;
            }

            writer.finish()?;
            Ok(())
        })();

        if let Err(err) = &result {
            log::warn!("failed to write {}: {err}", path.display());
            return result;
        }

        tempfile
            .as_file()
            .sync_all()
            .map_err(Error::WriteError)?;
        let persisted = tempfile.persist(path).map_err(|e| Error::WriteError(e.error))?;
        persisted.sync_all().map_err(Error::WriteError)?;

        log::debug!("saved password safe to {}", path.display());
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Every record the database owns, in file/insertion order.
    pub fn all_records(&self) -> &[Record] {
        &self.records
    }

    /// Creates a new record with `title`/`password`, filed under `group` (if any), and returns a
    /// reference to it.
    pub fn create_record(&mut self, title: &str, password: &str, group: Option<&str>) -> &Record {
        let mut record = Record::new(title, password);
        if let Some(group) = group {
            record.set_group(group);
        }
        self.records.push(record);
        self.records.last().expect("just pushed")
    }

    /// Registers an empty synthetic group. No-op (besides normalization) if records already place
    /// it in the tree.
    pub fn create_group(&mut self, name: &str, parent: Option<&str>) -> GroupPath {
        let path = match parent {
            Some(parent) if !parent.is_empty() => format!("{parent}.{name}"),
            _ => name.to_string(),
        };

        if !self.empty_groups.contains(&path) {
            self.empty_groups.push(path.clone());
        }

        path
    }

    /// Removes the record with the given id, if present.
    pub fn delete_record(&mut self, id: Uuid) {
        self.records.retain(|r| r.id() != Some(id));
    }

    /// Mutable access to the record with the given id, if present — for editing fields in place
    /// (title, password, notes, or any caller-added field the holder doesn't interpret).
    pub fn record_mut(&mut self, id: Uuid) -> Option<&mut Record> {
        self.records.iter_mut().find(|r| r.id() == Some(id))
    }

    /// Removes every record at or under `path`, and the synthetic group itself.
    pub fn delete_group(&mut self, path: &str) {
        self.records.retain(|r| !group::is_or_under(&r.group(), path));
        self.empty_groups.retain(|g| !group::is_or_under(g, path));
    }

    fn tree(&self) -> GroupTree {
        let record_groups = self.records.iter().map(|r| r.group());
        let record_groups: Vec<String> = record_groups.collect();
        let all_paths = record_groups.iter().map(String::as_str).chain(self.empty_groups.iter().map(String::as_str));
        GroupTree::build(all_paths)
    }

    /// Top-level entities: records with no group, and groups whose path has no dot.
    pub fn roots(&self) -> Vec<Entity<'_>> {
        let tree = self.tree();
        let mut entities: Vec<Entity<'_>> =
            tree.roots().iter().map(|path| Entity::Group(Group { path: path.clone() })).collect();
        entities.extend(self.records.iter().filter(|r| r.group().is_empty()).map(Entity::Record));
        entities
    }

    /// Immediate subgroup paths under `path`.
    pub fn subgroups(&self, path: &str) -> Vec<GroupPath> {
        self.tree().subgroups(path).to_vec()
    }

    /// Records filed directly (not recursively) under `path`.
    pub fn records(&self, path: &str) -> Vec<&Record> {
        self.records.iter().filter(|r| r.group() == path).collect()
    }

    /// Every record at or under `path`, recursively.
    pub fn deep_records(&self, path: &str) -> Vec<&Record> {
        self.records.iter().filter(|r| group::is_or_under(&r.group(), path)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_empty_has_version_3() {
        let db = Database::create_empty(b"pw");
        assert_eq!(db.header().version(), Some(3));
        assert!(db.all_records().is_empty());
    }

    #[test]
    fn save_then_open_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.psafe3");

        let mut db = Database::create_empty(b"hunter2");
        db.create_record("mail", "s3cr3t", Some("Work.Email"));
        db.save(&path).unwrap();

        let reopened = Database::open(&path, b"hunter2").unwrap();
        assert_eq!(reopened.all_records().len(), 1);
        assert_eq!(reopened.all_records()[0].title(), "mail");
        assert_eq!(reopened.all_records()[0].group(), "Work.Email");
    }

    #[test]
    fn save_with_new_key_changes_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.psafe3");

        let mut db = Database::create_empty(b"old");
        db.save_with_new_key(&path, b"new").unwrap();

        assert!(Database::open(&path, b"old").is_err());
        assert!(Database::open(&path, b"new").is_ok());
    }

    #[test]
    fn delete_group_removes_nested_records() {
        let mut db = Database::create_empty(b"pw");
        db.create_record("a", "", Some("Work"));
        db.create_record("b", "", Some("Work.Email"));
        db.create_record("c", "", Some("Personal"));

        db.delete_group("Work");

        assert_eq!(db.all_records().len(), 1);
        assert_eq!(db.all_records()[0].title(), "c");
    }

    #[test]
    fn deep_records_includes_subgroups() {
        let mut db = Database::create_empty(b"pw");
        db.create_record("a", "", Some("Work"));
        db.create_record("b", "", Some("Work.Email"));
        db.create_record("c", "", Some("Personal"));

        assert_eq!(db.deep_records("Work").len(), 2);
    }

    #[test]
    fn records_returns_only_direct_children() {
        let mut db = Database::create_empty(b"pw");
        db.create_record("a", "", Some("Work"));
        db.create_record("b", "", Some("Work.Email"));

        assert_eq!(db.records("Work").len(), 1);
        assert_eq!(db.records("Work")[0].title(), "a");
    }

    #[test]
    fn create_group_is_visible_before_any_record() {
        let mut db = Database::create_empty(b"pw");
        db.create_group("Archive", None);
        let roots = db.roots();
        assert!(roots.iter().any(|e| matches!(e, Entity::Group(g) if g.path() == "Archive")));
    }
}
