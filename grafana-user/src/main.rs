//! `grafana-user` entry point: reconcile one Grafana user and print the
//! structured result on stdout.

use std::env;
use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;

use grafana_user::app;
use grafana_user::inbound::cli::{GrafanaUserSettings, RunReport, display_request};
use ortho_config::{OrthoConfig, OrthoError};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<OsString> = env::args_os().collect();
    let report = match GrafanaUserSettings::load_from_iter(args.clone()) {
        Ok(settings) => match Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(app::run(&settings)),
            Err(error) => RunReport::failure(
                format!("create Tokio runtime: {error}"),
                &settings.secrets(),
            ),
        },
        Err(error) => {
            if let Some(request) = display_request(&error) {
                return emit_text(&request.render().to_string());
            }
            configuration_failure(&error, &args)
        }
    };

    emit(&report)
}

fn configuration_failure(error: &OrthoError, args: &[OsString]) -> RunReport {
    let secrets = GrafanaUserSettings::raw_secrets(args);
    let secret_refs: Vec<&str> = secrets.iter().map(String::as_str).collect();
    RunReport::failure(format!("invalid configuration: {error}"), &secret_refs)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if let Err(e) = fmt()
        .with_env_filter(filter)
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

fn emit(report: &RunReport) -> ExitCode {
    let written = serde_json::to_string(report)
        .map_err(io::Error::other)
        .and_then(|json| writeln!(io::stdout().lock(), "{json}"));
    match written {
        Ok(()) => report.exit_code(),
        Err(error) => {
            warn!(error = %error, "failed to write result");
            ExitCode::FAILURE
        }
    }
}

fn emit_text(text: &str) -> ExitCode {
    match write!(io::stdout().lock(), "{text}") {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            warn!(error = %error, "failed to write help text");
            ExitCode::FAILURE
        }
    }
}
