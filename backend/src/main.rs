use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match server::start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("kost failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
