//! The LMT configuration store.
//!
//! The configuration is read once at startup and handed by reference to whatever needs it.
//! Values come from the built-in defaults, overlaid by the configuration file (`TOML`), and
//! can be changed afterwards through the setters.
use crate::{Error, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// The configuration file used when one is not supplied.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/lmt/lmt.conf";

/// The default read-only database user.
const DEFAULT_RO_USER: &str = "lwatchclient";

/// The default read-write database user.
const DEFAULT_RW_USER: &str = "lwatchadmin";

/// The default database host.
const DEFAULT_HOST: &str = "localhost";

/// The default directory holding the file system databases.
const DEFAULT_DIRECTORY: &str = "/var/lib/lmt";

/// The LMT configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    ro_user: Option<String>,
    ro_password: Option<String>,
    rw_user: Option<String>,
    rw_password: Option<String>,
    host: Option<String>,
    /// `0` lets the database pick its default port.
    port: u16,
    debug: bool,
    directory: PathBuf,
    schema_file: Option<PathBuf>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            ro_user: Some(DEFAULT_RO_USER.to_string()),
            ro_password: None,
            rw_user: Some(DEFAULT_RW_USER.to_string()),
            rw_password: None,
            host: Some(DEFAULT_HOST.to_string()),
            port: 0,
            debug: false,
            directory: PathBuf::from(DEFAULT_DIRECTORY),
            schema_file: None,
        }
    }
}
impl Config {
    /// Initialize the configuration.
    ///
    /// An explicit configuration file must exist and be well formed. When no file is given the
    /// [DEFAULT_CONFIG_PATH] is used if it exists, otherwise the built-in defaults are used.
    ///
    /// # Arguments
    ///
    /// * `verbose` when `true` reports which file was loaded.
    /// * `path` is the optional configuration file pathname.
    pub fn init(verbose: bool, path: Option<&Path>) -> Result<Config> {
        let mut config = Config::default();
        match path {
            Some(path) => config.load(path, verbose)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    config.load(default_path, verbose)?;
                } else if verbose {
                    log::info!("{} not found, using the default configuration.", DEFAULT_CONFIG_PATH);
                }
            }
        }
        Ok(config)
    }

    /// Overlay the configuration with the contents of a file.
    ///
    /// # Arguments
    ///
    /// * `path` is the configuration file pathname.
    /// * `verbose` when `true` logs the file that was loaded.
    fn load(&mut self, path: &Path, verbose: bool) -> Result<()> {
        let outcome = match fs::read_to_string(path) {
            Ok(content) => self.merge(&content),
            Err(err) => Err(Error::Config(err.to_string())),
        };
        match outcome {
            Ok(_) => {
                if verbose {
                    log::info!("Loaded configuration from {}.", path.display());
                }
                Ok(())
            }
            Err(Error::Config(reason)) => {
                let reason = format!("{}: {}", path.display(), reason);
                // the caller reports the error
                if verbose {
                    log::debug!("{}", reason);
                }
                Err(Error::Config(reason))
            }
            Err(err) => Err(err),
        }
    }

    /// Overlay the configuration with `TOML` content. Keys that are not present keep their
    /// current value.
    ///
    /// # Arguments
    ///
    /// * `content` is the configuration file content.
    fn merge(&mut self, content: &str) -> Result<()> {
        let file: ConfigFile = match toml::from_str(content) {
            Ok(file) => file,
            Err(err) => return Err(Error::Config(err.message().to_string())),
        };
        let db = file.database;
        if db.ro_user.is_some() {
            self.ro_user = db.ro_user;
        }
        if db.ro_password.is_some() {
            self.ro_password = db.ro_password;
        }
        if db.rw_user.is_some() {
            self.rw_user = db.rw_user;
        }
        if db.rw_password.is_some() {
            self.rw_password = db.rw_password;
        }
        if db.host.is_some() {
            self.host = db.host;
        }
        if let Some(port) = db.port {
            self.port = port;
        }
        if let Some(debug) = db.debug {
            self.debug = debug;
        }
        if let Some(directory) = db.directory {
            self.directory = directory;
        }
        if db.schema_file.is_some() {
            self.schema_file = db.schema_file;
        }
        Ok(())
    }

    /// Get the read-only database user.
    pub fn ro_user(&self) -> Option<&str> {
        self.ro_user.as_deref()
    }
    /// Set the read-only database user.
    pub fn set_ro_user(&mut self, user: Option<&str>) {
        self.ro_user = user.map(String::from);
    }
    /// Get the read-only database password.
    pub fn ro_password(&self) -> Option<&str> {
        self.ro_password.as_deref()
    }
    /// Set the read-only database password.
    pub fn set_ro_password(&mut self, password: Option<&str>) {
        self.ro_password = password.map(String::from);
    }
    /// Get the read-write database user.
    pub fn rw_user(&self) -> Option<&str> {
        self.rw_user.as_deref()
    }
    /// Set the read-write database user.
    pub fn set_rw_user(&mut self, user: Option<&str>) {
        self.rw_user = user.map(String::from);
    }
    /// Get the read-write database password.
    pub fn rw_password(&self) -> Option<&str> {
        self.rw_password.as_deref()
    }
    /// Set the read-write database password.
    pub fn set_rw_password(&mut self, password: Option<&str>) {
        self.rw_password = password.map(String::from);
    }
    /// Get the database host.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
    /// Set the database host.
    pub fn set_host(&mut self, host: Option<&str>) {
        self.host = host.map(String::from);
    }
    /// Get the database port.
    pub fn port(&self) -> u16 {
        self.port
    }
    /// Set the database port.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }
    /// Get the debug flag.
    pub fn debug(&self) -> bool {
        self.debug
    }
    /// Set the debug flag.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }
    /// Get the directory holding the file system databases.
    pub fn directory(&self) -> &Path {
        self.directory.as_path()
    }
    /// Set the directory holding the file system databases.
    pub fn set_directory(&mut self, directory: &Path) {
        self.directory = directory.to_path_buf();
    }
    /// Get the default schema file.
    pub fn schema_file(&self) -> Option<&Path> {
        self.schema_file.as_deref()
    }
    /// Set the default schema file.
    pub fn set_schema_file(&mut self, schema_file: Option<&Path>) {
        self.schema_file = schema_file.map(Path::to_path_buf);
    }
}

/// The configuration file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    database: DatabaseSection,
}

/// The `[database]` section of the configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatabaseSection {
    ro_user: Option<String>,
    ro_password: Option<String>,
    rw_user: Option<String>,
    rw_password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    debug: Option<bool>,
    directory: Option<PathBuf>,
    schema_file: Option<PathBuf>,
}
