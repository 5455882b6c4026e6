use std::process::ExitCode;

fn main() -> ExitCode {
    sundial_cli::run()
}
