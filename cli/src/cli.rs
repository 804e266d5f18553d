//! The `lmtinit` command line interface.
//!
//! The command line follows the other LMT tools, a single action flag (add, delete, or list)
//! plus options that override the configuration. It's built with the `clap` programming
//! `API` rather than `derive`.

use clap::{error::ErrorKind, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use lmt_lib::{admin_prelude::*, logs, Config};
use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

/// The command line interface result.
pub type Result<T> = std::result::Result<T, Error>;

/// The CLI error definition.
#[derive(Debug)]
pub struct Error(String);
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error(error.to_string())
    }
}
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error(error)
    }
}
impl From<lmt_lib::Error> for Error {
    fn from(error: lmt_lib::Error) -> Self {
        Error(error.to_string())
    }
}
impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error(format!("io: {error}"))
    }
}

pub use v1::{get, initialize_and_run, usage_error};
mod v1 {
    //! The current command line implementation.
    use super::*;

    /// The command line definition. The help shows the database user defaults from the default
    /// configuration file, or the built-in defaults if it cannot be loaded.
    pub fn get() -> Command {
        let defaults = Config::init(false, None).unwrap_or_default();
        command(&defaults)
    }

    /// Build the command line definition.
    ///
    /// # Arguments
    ///
    /// * `defaults` is the configuration used to show default values in the help.
    fn command(defaults: &Config) -> Command {
        let binary_name = env!("CARGO_BIN_NAME");
        let version = env!("CARGO_PKG_VERSION");
        Command::new(binary_name)
            .about("Create, remove, or list the LMT file system databases.")
            .version(version)
            // show help if nothing is on the command line
            .arg_required_else_help(true)
            .args(CommandLineArgs::get(defaults))
            .group(CommandLineArgs::action_group())
    }

    /// Report a command line parse error and get the exit code.
    ///
    /// # Arguments
    ///
    /// * `err` is the error `clap` returned.
    pub fn usage_error(err: clap::Error) -> ExitCode {
        let _ = err.print();
        match is_usage_error(&err) {
            true => ExitCode::FAILURE,
            false => ExitCode::SUCCESS,
        }
    }

    /// Help and version requests come back as errors but they are not failures.
    fn is_usage_error(err: &clap::Error) -> bool {
        !matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
    }

    /// This is a mainline helper that prepares the runtime environment and runs the command.
    ///
    /// # Arguments
    ///
    /// * `args` holds the arguments from the parsed command line.
    pub fn initialize_and_run(args: ArgMatches) -> Result<()> {
        let cmd_args = CommandLineArgs::from(&args);
        initialize(&cmd_args);
        let mut config = Config::init(true, cmd_args.config_file().as_deref())?;
        config.set_debug(true);
        let admin = lmt_admin(&config);
        run(&cmd_args, &config, &admin, &mut io::stdout().lock())
    }

    /// Prepare the runtime environment.
    ///
    /// # Arguments
    ///
    /// * `cmd_args` holds the arguments from the parsed command line.
    fn initialize(cmd_args: &CommandLineArgs) {
        match logs::initialize(logs::LogProperties {
            level: logs::level_filter(cmd_args.verbosity()),
            logfile_path: cmd_args.logfile(),
            logfile_append: cmd_args.append(),
            file_loggers: vec![env!("CARGO_CRATE_NAME").to_string(), "lmt_lib".to_string()],
        }) {
            Ok(_) => (),
            Err(log_error) => eprintln!("Error initializing logging!!! {}", log_error),
        };
    }

    /// Run the requested action.
    ///
    /// # Arguments
    ///
    /// * `cmd_args` holds the arguments from the parsed command line.
    /// * `config` is the LMT configuration.
    /// * `admin` is the file system administration `API`.
    /// * `writer` is where command output goes.
    pub(in crate::cli) fn run(
        cmd_args: &CommandLineArgs,
        config: &Config,
        admin: &LmtAdmin,
        writer: &mut impl Write,
    ) -> Result<()> {
        let action = cmd_args.action()?;
        let credentials = resolve_credentials(&action, config, cmd_args.user(), cmd_args.password());
        log::debug!("{:?} as {}", action, credentials);
        match action {
            Action::List => {
                for fsname in admin.list(&credentials)? {
                    writeln!(writer, "{}", fsname)?;
                }
            }
            Action::Delete(fsname) => {
                admin.delete(&credentials, &fsname)?;
                log::info!("Removed the {} file system database.", fsname);
            }
            Action::Add(fsname) => {
                let schema_file = cmd_args.schema_file();
                let schema = Schema::load(schema_file.as_deref().or(config.schema_file()))?;
                admin.add(&credentials, &fsname, &schema)?;
                log::info!("Created the {} file system database.", fsname);
            }
        }
        Ok(())
    }

    /// Get the database credentials for an action. Listing defaults to the read-only
    /// credentials, everything else defaults to the read-write credentials.
    ///
    /// # Arguments
    ///
    /// * `action` is what will be run.
    /// * `config` is the LMT configuration.
    /// * `user` is the command line user override.
    /// * `password` is the command line password override.
    pub(in crate::cli) fn resolve_credentials(
        action: &Action,
        config: &Config,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Credentials {
        let (default_user, default_password) = match action {
            Action::List => (config.ro_user(), config.ro_password()),
            Action::Add(_) | Action::Delete(_) => (config.rw_user(), config.rw_password()),
        };
        Credentials::new(user.or(default_user), password.or(default_password))
    }

    /// What the command line asked for.
    #[derive(Debug, PartialEq)]
    pub(in crate::cli) enum Action {
        /// Create the database for a file system.
        Add(String),
        /// Remove the database for a file system.
        Delete(String),
        /// List the file systems that have a database.
        List,
    }

    /// A filename parser used by the CLI.
    ///
    /// # Arguments
    ///
    /// * `filename` - the filename as entered on the command line.
    fn parse_filename(filename: &str) -> std::result::Result<PathBuf, String> {
        if filename.is_empty() {
            Err("The filename cannot be empty.".to_string())
        } else {
            let filepath = PathBuf::from(filename);
            if filepath.is_dir() {
                Err(format!("{} is a directory...", filename))
            } else {
                Ok(filepath)
            }
        }
    }

    /// The command line arguments.
    pub(in crate::cli) struct CommandLineArgs<'a>(
        /// The parsed command line arguments.
        &'a ArgMatches,
    );
    impl<'a> CommandLineArgs<'a> {
        /// The add a file system argument id.
        const ADD: &'static str = "ADD";
        /// The delete a file system argument id.
        const DELETE: &'static str = "DELETE";
        /// The list file systems argument id.
        const LIST: &'static str = "LIST";
        /// The action group id.
        const ACTION: &'static str = "ACTION";
        /// The config file argument id.
        const CONFIG_FILE: &'static str = "CONFIG_FILE";
        /// The schema file argument id.
        const SCHEMA_FILE: &'static str = "SCHEMA_FILE";
        /// The database user argument id.
        const USER: &'static str = "USER";
        /// The database password argument id.
        const PASSWORD: &'static str = "PASSWORD";
        /// The log file argument id.
        const LOGFILE: &'static str = "LOGFILE";
        /// The append to log file argument id.
        const APPEND: &'static str = "APPEND_LOGFILE";
        /// The logging verbosity level argument id.
        const VERBOSITY: &'static str = "LOG_VERBOSITY";
        /// Get the command line arguments.
        ///
        /// # Arguments
        ///
        /// * `defaults` is the configuration used to show default values in the help.
        fn get(defaults: &Config) -> Vec<Arg> {
            let user_help = format!(
                "Connect to the database as USER (DEFAULT {} with -l, otherwise {}).",
                defaults.ro_user().unwrap_or("<nil>"),
                defaults.rw_user().unwrap_or("<nil>"),
            );
            let password_help = match (defaults.ro_password(), defaults.rw_password()) {
                (None, None) => "Connect to the database with PASS (DEFAULT <nil>).",
                _ => "Connect to the database with PASS (DEFAULT from the config file).",
            };
            vec![
                Arg::new(Self::ADD)
                    .short('a')
                    .long("add")
                    .action(ArgAction::Set)
                    .value_name("FS")
                    .help("Create the database for file system FS."),
                Arg::new(Self::DELETE)
                    .short('d')
                    .long("delete")
                    .action(ArgAction::Set)
                    .value_name("FS")
                    .help("Remove the database for file system FS."),
                Arg::new(Self::LIST)
                    .short('l')
                    .long("list")
                    .action(ArgAction::SetTrue)
                    .help("List the file systems in the database."),
                Arg::new(Self::CONFIG_FILE)
                    .short('c')
                    .long("config-file")
                    .action(ArgAction::Set)
                    .value_name("FILE")
                    .value_parser(parse_filename)
                    .help("Use an alternate config file."),
                Arg::new(Self::SCHEMA_FILE)
                    .short('s')
                    .long("schema-file")
                    .action(ArgAction::Set)
                    .value_name("FILE")
                    .value_parser(parse_filename)
                    .help("Use an alternate schema file."),
                Arg::new(Self::USER)
                    .short('u')
                    .long("user")
                    .action(ArgAction::Set)
                    .value_name("USER")
                    .help(user_help),
                Arg::new(Self::PASSWORD)
                    .short('p')
                    .long("password")
                    .action(ArgAction::Set)
                    .value_name("PASS")
                    .help(password_help),
                Arg::new(Self::LOGFILE)
                    .long("logfile")
                    .action(ArgAction::Set)
                    .value_name("FILE")
                    .value_parser(parse_filename)
                    .help("The log filename (DEFAULT stderr)."),
                Arg::new(Self::APPEND)
                    .long("append")
                    .requires(Self::LOGFILE)
                    .action(ArgAction::SetTrue)
                    .help("Append to the logfile, otherwise overwrite."),
                Arg::new(Self::VERBOSITY)
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Logging verbosity (once=INFO, twice=DEBUG, +twice=TRACE)"),
            ]
        }
        /// Exactly one of add, delete, or list is required.
        fn action_group() -> ArgGroup {
            ArgGroup::new(Self::ACTION).args([Self::ADD, Self::DELETE, Self::LIST]).required(true).multiple(false)
        }
        /// Get the requested action.
        pub fn action(&self) -> Result<Action> {
            match (self.add(), self.delete(), self.list()) {
                (Some(fsname), None, false) => Ok(Action::Add(fsname)),
                (None, Some(fsname), false) => Ok(Action::Delete(fsname)),
                (None, None, true) => Ok(Action::List),
                (None, None, false) => Err(Error::from("Use one of -a, -d, or -l options.")),
                _ => Err(Error::from("Use only one of -a, -d, and -l options.")),
            }
        }
        /// Get the file system to add.
        fn add(&self) -> Option<String> {
            self.0.get_one::<String>(Self::ADD).cloned()
        }
        /// Get the file system to delete.
        fn delete(&self) -> Option<String> {
            self.0.get_one::<String>(Self::DELETE).cloned()
        }
        /// Get the list file systems flag.
        fn list(&self) -> bool {
            self.0.get_flag(Self::LIST)
        }
        /// Get the config file argument.
        pub fn config_file(&self) -> Option<PathBuf> {
            self.0.get_one::<PathBuf>(Self::CONFIG_FILE).cloned()
        }
        /// Get the schema file argument.
        pub fn schema_file(&self) -> Option<PathBuf> {
            self.0.get_one::<PathBuf>(Self::SCHEMA_FILE).cloned()
        }
        /// Get the database user override.
        pub fn user(&self) -> Option<&str> {
            self.0.get_one::<String>(Self::USER).map(String::as_str)
        }
        /// Get the database password override.
        pub fn password(&self) -> Option<&str> {
            self.0.get_one::<String>(Self::PASSWORD).map(String::as_str)
        }
        /// Get the logfile name argument.
        pub fn logfile(&self) -> Option<PathBuf> {
            self.0.get_one::<PathBuf>(Self::LOGFILE).cloned()
        }
        /// Get the flag controlling if the logfile should be appended too.
        pub fn append(&self) -> bool {
            self.0.get_flag(Self::APPEND)
        }
        /// Get the logging verbosity flag.
        pub fn verbosity(&self) -> u8 {
            std::cmp::min(self.0.get_one::<u8>(Self::VERBOSITY).map_or(0, |v| *v), 3)
        }
    }
    impl<'a> From<&'a ArgMatches> for CommandLineArgs<'a> {
        fn from(args: &'a ArgMatches) -> Self {
            Self(args)
        }
    }

}
