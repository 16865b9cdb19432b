use std::process::ExitCode;

fn main() -> ExitCode {
    amica_cli::run()
}
