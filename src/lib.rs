//! A reader, writer, and in-memory database for Password Safe V3 (`.psafe3`) files.
//!
//! ```no_run
//! use pws3::Database;
//!
//! let mut db = Database::create_empty(b"hunter2");
//! db.create_record("webmail", "s3cr3t", Some("Personal.Email"));
//! db.save("safe.psafe3").unwrap();
//!
//! let reopened = Database::open("safe.psafe3", b"hunter2").unwrap();
//! assert_eq!(reopened.all_records().len(), 1);
//! ```

mod codec;
mod database;
mod error;
mod field;
mod group;
mod header;
mod key;
mod reader;
mod record;
mod writer;

pub use database::{Database, Entity, Group};
pub use error::{Error, Result};
pub use field::{Field, FieldHolder};
pub use group::GroupPath;
pub use header::Header;
pub use key::PwsafeKey;
pub use record::Record;
pub use writer::DEFAULT_ITERATIONS;
