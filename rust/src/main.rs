mod config;
mod error;
mod launcher;
mod relay;
mod split;
mod support;

use crate::config::Settings;
use crate::launcher::{launch, CallerStreams};
use crate::support::command_line::OsCommandLine;
use crate::support::telemetry::init_telemetry;

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    init_telemetry(settings);

    // A caller stdin read can still be parked on a blocking thread here, so leave
    // through `exit` rather than waiting for the runtime to shut down.
    match launch(&OsCommandLine, CallerStreams::current()).await {
        Ok(code) => {
            tracing::debug!("exit code: {code}");
            std::process::exit(code);
        }
        Err(err) => {
            tracing::error!("{err}");
            let code = err.exit_code();
            tracing::debug!("exit code: {code}");
            std::process::exit(code);
        }
    }
}
