//! audit-verify: offline audit chain verifier.

use audit_verify::{verify_log, SequenceRange};
use clap::Parser;
use fi_telemetry::{init_tracing, TelemetryConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Verify a Foundry Integrity audit log.
#[derive(Parser, Debug)]
#[command(name = "audit-verify")]
#[command(about = "Re-walk an audit log and report the first broken record")]
struct Args {
    /// JSON-lines audit log (FI_AUDIT_LOG_PATH of the node)
    log: PathBuf,

    /// First sequence number to verify
    #[arg(long)]
    from: Option<u64>,

    /// Last sequence number to verify (inclusive)
    #[arg(long)]
    to: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::for_service("audit-verify");
    if std::env::var_os("FI_LOG_LEVEL").is_none() {
        telemetry.log_level = "warn".into();
    }
    // Keep stdout clean for the JSON report.
    telemetry.console_output &= !args.json;
    if let Err(e) = init_tracing(&telemetry) {
        eprintln!("Warning: logging disabled: {e}");
    }

    let range = SequenceRange {
        from: args.from,
        to: args.to,
    };
    let report = match verify_log(&args.log, range) {
        Ok(report) => report,
        Err(e) => {
            error!(path = %args.log.display(), error = %e, "Verification could not run");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::from(2);
            }
        }
    } else {
        println!("{}", report.render());
    }

    if report.is_intact() {
        info!(checked = report.verification.checked, "Audit log intact");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
