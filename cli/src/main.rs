//! The LMT file system database administration tool.
mod cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match cli::get().try_get_matches() {
        Ok(args) => args,
        Err(err) => return cli::usage_error(err),
    };
    match cli::initialize_and_run(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", env!("CARGO_BIN_NAME"), err);
            ExitCode::FAILURE
        }
    }
}
