use log::{debug, error};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = match vmsync_lib::bootstrap() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("vmsync: {e}");
            return ExitCode::from(e.exit_code());
        }
    };

    match vmsync_lib::sync(&config).await {
        Ok(report) => {
            debug!("{report:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Synchronisation aborted: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
