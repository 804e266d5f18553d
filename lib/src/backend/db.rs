//! The `SQLite` implementation of file system administration.
//!
//! Each file system database is a `SQLite` file named after the database
//! (`filesystem_<fsname>.db`) in the configured directory.

use crate::{
    admin::{database_name, Credentials, DatabaseAdmin, Schema, FS_PREFIX},
    Config, Error, Result,
};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

// Since database functionality is scoped to this module it's okay to add the error handler
// here and not in the module where Error is defined.
impl From<rusqlite::Error> for Error {
    /// Add support to convert rusqlite database errors.
    fn from(err: rusqlite::Error) -> Self {
        Error::Db(format!("sql: {}", err))
    }
}

pub(crate) use v1::SqliteAdmin;
mod v1 {
    //! The first version of the database implementation.
    use super::*;
    use chrono::Utc;
    use rusqlite::named_params;
    use std::{fs, io};

    /// The file extension of a database.
    const DB_EXTENSION: &str = "db";

    /// The schema version recorded in new databases.
    const SCHEMA_VERSION: &str = "1.1";

    /// What an account is allowed to do.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
    enum Access {
        ReadOnly,
        ReadWrite,
    }

    /// A database account.
    #[derive(Debug)]
    struct Account {
        credentials: Credentials,
        access: Access,
    }

    /// The file system administration backed by `SQLite`.
    #[derive(Debug)]
    pub(crate) struct SqliteAdmin {
        /// The directory holding the databases.
        directory: PathBuf,
        /// The host and port of the configured database, used in messages.
        target: String,
        /// The accounts allowed to use the databases.
        accounts: Vec<Account>,
        /// Trace statements when `true`.
        debug: bool,
    }
    impl SqliteAdmin {
        /// Create the database administration from the LMT configuration.
        ///
        /// # Arguments
        ///
        /// * `config` is the LMT configuration.
        pub(crate) fn new(config: &Config) -> Self {
            let target = match config.port() {
                0 => config.host().unwrap_or("localhost").to_string(),
                port => format!("{}:{}", config.host().unwrap_or("localhost"), port),
            };
            let accounts = vec![
                Account {
                    credentials: Credentials::new(config.ro_user(), config.ro_password()),
                    access: Access::ReadOnly,
                },
                Account {
                    credentials: Credentials::new(config.rw_user(), config.rw_password()),
                    access: Access::ReadWrite,
                },
            ];
            Self { directory: config.directory().to_path_buf(), target, accounts, debug: config.debug() }
        }

        /// Verify the credentials have the required access.
        ///
        /// # Arguments
        ///
        /// * `credentials` are the connection credentials.
        /// * `required` is the access needed.
        fn authorize(&self, credentials: &Credentials, required: Access) -> Result<()> {
            let granted = self
                .accounts
                .iter()
                .filter(|account| account.credentials == *credentials)
                .map(|account| account.access)
                .max();
            match granted {
                Some(access) if access >= required => Ok(()),
                Some(_) => Err(Error::Access(format!("{}@{} does not have write access.", credentials, self.target))),
                None => Err(Error::Access(format!("Access denied for {}@{}.", credentials, self.target))),
            }
        }

        /// The database pathname for a file system.
        ///
        /// # Arguments
        ///
        /// * `fsname` is the file system name.
        fn db_path(&self, fsname: &str) -> PathBuf {
            self.directory.join(format!("{}.{}", database_name(fsname), DB_EXTENSION))
        }

        /// Create a connection to a database.
        ///
        /// # Arguments
        ///
        /// * `path` is the database pathname.
        /// * `flags` control how the database is opened.
        fn db_connection(&self, path: &Path, flags: OpenFlags) -> Result<Connection> {
            let mut conn = Connection::open_with_flags(path, flags)?;
            if self.debug {
                conn.trace(Some(trace_sql));
            }
            Ok(conn)
        }
    }

    impl DatabaseAdmin for SqliteAdmin {
        fn list(&self, credentials: &Credentials) -> Result<Vec<String>> {
            self.authorize(credentials, Access::ReadOnly)?;
            log::debug!("listing {} as {}@{}", self.directory.display(), credentials, self.target);
            let entries = match fs::read_dir(&self.directory) {
                Ok(entries) => entries,
                // nothing has been created yet
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} does not exist", self.directory.display());
                    return Ok(vec![]);
                }
                Err(err) => {
                    let reason = format!("Error reading {} ({}).", self.directory.display(), err);
                    return Err(Error::Db(reason));
                }
            };
            let prefix = format!("{}_", FS_PREFIX);
            let mut db_names = vec![];
            for entry in entries {
                let path = entry?.path();
                if !path.is_file() || path.extension().map_or(true, |ext| ext != DB_EXTENSION) {
                    continue;
                }
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    if stem.starts_with(&prefix) {
                        db_names.push(stem.to_string());
                    }
                }
            }
            db_names.sort();
            Ok(db_names)
        }

        fn exists(&self, credentials: &Credentials, fsname: &str) -> Result<bool> {
            self.authorize(credentials, Access::ReadOnly)?;
            Ok(self.db_path(fsname).is_file())
        }

        fn create(&self, credentials: &Credentials, fsname: &str, schema: &Schema) -> Result<()> {
            self.authorize(credentials, Access::ReadWrite)?;
            let db_path = self.db_path(fsname);
            if db_path.exists() {
                return Err(Error::Exists(format!("{} already exists.", db_path.display())));
            }
            if !self.directory.exists() {
                log::debug!("creating {}", self.directory.display());
                fs::create_dir_all(&self.directory)?;
            }
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
            // the connection has to be closed before the database can be removed
            let result = self.db_connection(&db_path, flags).and_then(|mut conn| init_schema(&mut conn, fsname, schema));
            if let Err(err) = result {
                if let Err(remove_err) = fs::remove_file(&db_path) {
                    log::warn!("Error removing {} ({}).", db_path.display(), remove_err);
                }
                return Err(err);
            }
            log::info!("Created {} using the {}.", db_path.display(), schema.source());
            Ok(())
        }

        fn drop_db(&self, credentials: &Credentials, fsname: &str) -> Result<()> {
            self.authorize(credentials, Access::ReadWrite)?;
            let db_path = self.db_path(fsname);
            if !db_path.is_file() {
                return Err(Error::NotFound(format!("{} does not exist.", db_path.display())));
            }
            match fs::remove_file(&db_path) {
                Ok(_) => {
                    log::info!("Removed {}.", db_path.display());
                    Ok(())
                }
                Err(err) => Err(Error::Db(format!("Error deleting database {} ({}).", db_path.display(), err))),
            }
        }
    }

    /// Log the statements executed against the database.
    fn trace_sql(sql: &str) {
        log::debug!("sql: {}", sql);
    }

    /// Apply the schema and register the file system.
    ///
    /// # Arguments
    ///
    /// * `conn` is the new database connection.
    /// * `fsname` is the file system name.
    /// * `schema` is what will be applied.
    fn init_schema(conn: &mut Connection, fsname: &str, schema: &Schema) -> Result<()> {
        log::debug!("db schema");
        let tx = conn.transaction()?;
        if let Err(err) = tx.execute_batch(schema.sql()) {
            return Err(Error::Schema(format!("Error applying the {} ({}).", schema.source(), err)));
        }
        const SQL: &str = r#"
        INSERT INTO FILESYSTEM_INFO (FILESYSTEM_NAME, SCHEMA_VERSION, CREATED)
            VALUES (:name, :version, :created)
        "#;
        let params = named_params! {
            ":name": fsname,
            ":version": SCHEMA_VERSION,
            ":created": Utc::now(),
        };
        if let Err(err) = tx.execute(SQL, params) {
            let reason = format!("Error registering {} with the {} ({}).", fsname, schema.source(), err);
            return Err(Error::Schema(reason));
        }
        tx.commit()?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::{admin::SchemaSource, backend::testlib::TestFixture};
        use pretty_assertions::assert_eq;

        fn testenv(fixture: &TestFixture) -> (SqliteAdmin, Credentials, Credentials) {
            let mut config = Config::default();
            config.set_directory(&fixture.path("db"));
            config.set_ro_password(Some("ro-secret"));
            config.set_rw_password(Some("rw-secret"));
            config.set_debug(true);
            let ro = Credentials::new(config.ro_user(), config.ro_password());
            let rw = Credentials::new(config.rw_user(), config.rw_password());
            (SqliteAdmin::new(&config), ro, rw)
        }

        #[test]
        fn lifecycle() {
            let fixture = TestFixture::create();
            let (admin, ro, rw) = testenv(&fixture);
            // the directory does not exist until something is created
            assert!(admin.list(&ro).unwrap().is_empty());
            assert!(!admin.exists(&ro, "scratch").unwrap());
            let schema = Schema::builtin();
            admin.create(&rw, "scratch", &schema).unwrap();
            admin.create(&rw, "home", &schema).unwrap();
            assert!(matches!(admin.create(&rw, "home", &schema), Err(Error::Exists(_))));
            // stray files are not databases
            fixture.create_content("db/notes.txt", "not a database");
            fixture.create_content("db/other_fs.db", "");
            assert_eq!(admin.list(&ro).unwrap(), vec!["filesystem_home", "filesystem_scratch"]);
            assert!(admin.exists(&ro, "scratch").unwrap());
            assert!(!admin.exists(&ro, "lscratchc").unwrap());
            // the file system is registered in the new database
            let conn = Connection::open_with_flags(admin.db_path("scratch"), OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
            let (name, version): (String, String) = conn
                .query_row("SELECT FILESYSTEM_NAME, SCHEMA_VERSION FROM FILESYSTEM_INFO", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })
                .unwrap();
            assert_eq!(name, "scratch");
            assert_eq!(version, SCHEMA_VERSION);
            drop(conn);
            admin.drop_db(&rw, "scratch").unwrap();
            assert!(matches!(admin.drop_db(&rw, "scratch"), Err(Error::NotFound(_))));
            assert_eq!(admin.list(&rw).unwrap(), vec!["filesystem_home"]);
        }

        #[test]
        fn unreadable_directory() {
            let fixture = TestFixture::create();
            let mut config = Config::default();
            config.set_directory(&fixture.create_content("db", "not a directory"));
            let ro = Credentials::new(config.ro_user(), config.ro_password());
            let admin = SqliteAdmin::new(&config);
            match admin.list(&ro) {
                Err(Error::Db(reason)) => assert!(reason.contains("db"), "{}", reason),
                other => panic!("expected a db error, got {:?}", other),
            }
        }

        #[test]
        fn authorize() {
            let fixture = TestFixture::create();
            let (admin, ro, rw) = testenv(&fixture);
            let schema = Schema::builtin();
            assert!(matches!(admin.create(&ro, "scratch", &schema), Err(Error::Access(_))));
            admin.create(&rw, "scratch", &schema).unwrap();
            assert!(matches!(admin.drop_db(&ro, "scratch"), Err(Error::Access(_))));
            let stranger = Credentials::new(Some("nobody"), None);
            assert!(matches!(admin.list(&stranger), Err(Error::Access(_))));
            let wrong_password = Credentials::new(rw.user.as_deref(), Some("guess"));
            assert!(matches!(admin.exists(&wrong_password, "scratch"), Err(Error::Access(_))));
            assert_eq!(admin.list(&ro).unwrap(), vec!["filesystem_scratch"]);
        }

        #[test]
        fn broken_schema() {
            let fixture = TestFixture::create();
            let (admin, _, rw) = testenv(&fixture);
            let path = fixture.create_content("broken.sql", "CREATE TABLE OST_INFO (OST_ID INTEGER PRIMARY KEY;");
            let schema = Schema::from_file(&path).unwrap();
            assert_eq!(schema.source(), &SchemaSource::File(path));
            assert!(matches!(admin.create(&rw, "scratch", &schema), Err(Error::Schema(_))));
            assert!(!admin.db_path("scratch").exists());
            // a schema without the file system table cannot register the file system
            let path = fixture.create_content("partial.sql", "CREATE TABLE OST_INFO (OST_ID INTEGER PRIMARY KEY);");
            let schema = Schema::from_file(&path).unwrap();
            match admin.create(&rw, "scratch", &schema) {
                Err(Error::Schema(reason)) => assert!(reason.contains("partial.sql"), "{} in {}", reason, fixture),
                other => panic!("expected a schema error, got {:?}", other),
            }
            assert!(!admin.db_path("scratch").exists());
        }
    }
}
