//! The file system database administration API.
use crate::{backend::db::SqliteAdmin, Config, Error, Result};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// The prefix of every file system database name.
pub const FS_PREFIX: &str = "filesystem";

/// Create the file system administration `API` for a configuration.
///
/// # Arguments
///
/// * `config` is the LMT configuration.
pub fn lmt_admin(config: &Config) -> LmtAdmin {
    LmtAdmin::new(Box::new(SqliteAdmin::new(config)))
}

/// The name of the database holding a file system.
///
/// # Arguments
///
/// * `fsname` is the file system name.
pub fn database_name(fsname: &str) -> String {
    format!("{}_{}", FS_PREFIX, fsname)
}

/// The file system name of a database, everything after the first `_`. A database name
/// without a `_` is returned unchanged.
///
/// # Arguments
///
/// * `db_name` is the database name.
pub fn filesystem_name(db_name: &str) -> &str {
    match db_name.split_once('_') {
        Some((_, fsname)) => fsname,
        None => db_name,
    }
}

/// Verify a file system name can be used to name a database.
///
/// # Arguments
///
/// * `fsname` is the file system name.
pub fn validate_fsname(fsname: &str) -> Result<()> {
    if fsname.is_empty() {
        Err(Error::Usage("The file system name cannot be empty.".to_string()))
    } else if fsname.starts_with('.') {
        Err(Error::Usage(format!("{}: file system names cannot start with '.'.", fsname)))
    } else if let Some(ch) = fsname.chars().find(|ch| !(ch.is_ascii_alphanumeric() || "_-.".contains(*ch))) {
        Err(Error::Usage(format!("{}: '{}' is not allowed in a file system name.", fsname, ch)))
    } else {
        Ok(())
    }
}

/// The user and password used to connect to the database.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    /// The database user.
    pub user: Option<String>,
    /// The database password.
    pub password: Option<String>,
}
impl Credentials {
    pub fn new(user: Option<&str>, password: Option<&str>) -> Self {
        Self { user: user.map(String::from), password: password.map(String::from) }
    }
}
/// Only the user is shown, passwords never end up in messages.
impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user.as_deref().unwrap_or("<nil>"))
    }
}

/// Where the schema came from.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemaSource {
    /// The schema compiled into the library.
    Builtin,
    /// A schema file.
    File(PathBuf),
}
impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Builtin => write!(f, "built-in schema"),
            SchemaSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The schema used to create a file system database.
#[derive(Clone, Debug)]
pub struct Schema {
    source: SchemaSource,
    sql: String,
}
impl Schema {
    /// The schema compiled into the library.
    pub fn builtin() -> Self {
        Self { source: SchemaSource::Builtin, sql: include_str!("backend/db/schema.sql").to_string() }
    }
    /// Read the schema from a file.
    ///
    /// # Arguments
    ///
    /// * `path` is the schema file pathname.
    pub fn from_file(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(sql) if sql.trim().is_empty() => Err(Error::Schema(format!("{} is empty.", path.display()))),
            Ok(sql) => Ok(Self { source: SchemaSource::File(path.to_path_buf()), sql }),
            Err(err) => Err(Error::Schema(format!("{} ({}).", path.display(), err))),
        }
    }
    /// Get the schema from a file or the built-in schema if there isn't one.
    ///
    /// # Arguments
    ///
    /// * `path` is the optional schema file pathname.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin()),
        }
    }
    /// Where the schema came from.
    pub fn source(&self) -> &SchemaSource {
        &self.source
    }
    /// The schema `SQL`.
    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// The operations a database must provide to manage file system databases.
pub trait DatabaseAdmin {
    /// Get the names of the file system databases.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    fn list(&self, credentials: &Credentials) -> Result<Vec<String>>;
    /// Determine if a file system database exists.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    /// * `fsname` is the file system name.
    fn exists(&self, credentials: &Credentials, fsname: &str) -> Result<bool>;
    /// Create a file system database.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    /// * `fsname` is the file system name.
    /// * `schema` describes the database that will be created.
    fn create(&self, credentials: &Credentials, fsname: &str, schema: &Schema) -> Result<()>;
    /// Remove a file system database.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    /// * `fsname` is the file system name.
    fn drop_db(&self, credentials: &Credentials, fsname: &str) -> Result<()>;
}

/// The file system administration `API`.
pub struct LmtAdmin(
    /// The database implementation.
    Box<dyn DatabaseAdmin>,
);
impl LmtAdmin {
    /// Create the administration `API` on top of a database implementation.
    ///
    /// # Arguments
    ///
    /// * `db` is the database implementation.
    pub fn new(db: Box<dyn DatabaseAdmin>) -> Self {
        Self(db)
    }
    /// Get the names of file systems that have a database, in the order the database
    /// returns them.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    pub fn list(&self, credentials: &Credentials) -> Result<Vec<String>> {
        let db_names = self.0.list(credentials)?;
        log::debug!("{} file system databases found", db_names.len());
        Ok(db_names.iter().map(|db_name| filesystem_name(db_name).to_string()).collect())
    }
    /// Create the database for a file system. It is an error if the database already exists.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    /// * `fsname` is the file system name.
    /// * `schema` describes the database that will be created.
    pub fn add(&self, credentials: &Credentials, fsname: &str, schema: &Schema) -> Result<()> {
        validate_fsname(fsname)?;
        if self.0.exists(credentials, fsname)? {
            return Err(Error::Exists(format!("The {} file system database already exists.", fsname)));
        }
        log::debug!("creating {} using the {}", database_name(fsname), schema.source());
        self.0.create(credentials, fsname, schema)
    }
    /// Remove the database for a file system. It is an error if the database does not exist.
    ///
    /// # Arguments
    ///
    /// * `credentials` are used to connect to the database.
    /// * `fsname` is the file system name.
    pub fn delete(&self, credentials: &Credentials, fsname: &str) -> Result<()> {
        validate_fsname(fsname)?;
        if !self.0.exists(credentials, fsname)? {
            return Err(Error::NotFound(format!("The {} file system database does not exist.", fsname)));
        }
        log::debug!("dropping {}", database_name(fsname));
        self.0.drop_db(credentials, fsname)
    }
}
