use std::process::ExitCode;

fn main() -> ExitCode {
    varconf_cli::run()
}
