use std::process::ExitCode;

fn main() -> ExitCode {
    ms_cli::init_tracing();
    let code = ms_cli::run_cli_from_args(std::env::args_os());
    ExitCode::from(code as u8)
}
