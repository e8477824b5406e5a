use std::process::ExitCode;

fn main() -> ExitCode {
    match courierd::run_server() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            // Telemetry may not be installed when launch fails early.
            tracing::error!(target: "courierd::process", %error, "daemon exited with an error");
            eprintln!("courierd: {error}");
            ExitCode::FAILURE
        }
    }
}
