//! `sales` binary: runs the CLI and turns failures into exit codes.

use std::process::ExitCode;

fn main() -> ExitCode {
    match sales_insights::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
