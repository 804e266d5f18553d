//! The LMT file system database administration library.
//!
//! The Lustre Monitoring Tool keeps the monitoring data for each file system in its own
//! database. This library holds the pieces the `lmtinit` front end needs to manage those
//! databases.
//!
//! # Architecture Overview
//!
//! * The configuration store ([Config]) holding the database credentials, host, port,
//!   and debug flag.
//! * The administration `API` ([admin_prelude::LmtAdmin]) that adds, deletes, and lists
//!   file system databases.
//! * The database backend that implements [admin_prelude::DatabaseAdmin]. Currently the
//!   only backend keeps each file system database in a `SQLite` file.
//! * The logging setup used by front ends ([logs]).
//!
//! The administration `API` only talks to the backend through the `DatabaseAdmin` trait so
//! front ends can be exercised without a database.
mod admin;
mod backend;
mod config;
pub mod logs;

pub use config::{Config, DEFAULT_CONFIG_PATH};

/// The file system administration `API` used by front ends.
pub mod admin_prelude {
    pub use crate::admin::{
        database_name, filesystem_name, lmt_admin, validate_fsname, Credentials, DatabaseAdmin, LmtAdmin, Schema,
        SchemaSource, FS_PREFIX,
    };
}

use std::{fmt, io, result};

/// The library result.
pub type Result<T> = result::Result<T, Error>;

/// The errors that can be returned by the library.
#[derive(Debug)]
pub enum Error {
    /// The configuration file could not be read or is malformed.
    Config(String),
    /// An argument handed to the library is not valid.
    Usage(String),
    /// The database credentials were rejected.
    Access(String),
    /// The file system database does not exist.
    NotFound(String),
    /// The file system database already exists.
    Exists(String),
    /// The schema could not be read or applied.
    Schema(String),
    /// Some other database or file error.
    Db(String),
    /// Logging could not be initialized.
    Log(String),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(reason) => write!(f, "config: {}", reason),
            Error::Usage(reason) => write!(f, "{}", reason),
            Error::Access(reason) => write!(f, "access: {}", reason),
            Error::NotFound(reason) => write!(f, "{}", reason),
            Error::Exists(reason) => write!(f, "{}", reason),
            Error::Schema(reason) => write!(f, "schema: {}", reason),
            Error::Db(reason) => write!(f, "db: {}", reason),
            Error::Log(reason) => write!(f, "log: {}", reason),
        }
    }
}
impl std::error::Error for Error {}

/// Consolidate standard IO errors as database errors.
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Db(format!("io: {error}"))
    }
}
