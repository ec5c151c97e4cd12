use std::process::ExitCode;

fn main() -> ExitCode {
    haulaway_cli::run()
}
