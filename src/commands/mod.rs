//! Command dispatch and handlers.

pub mod create;
pub mod list;
pub mod next_id;

use std::error::Error as _;

use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::sites::SiteError;

/// Dispatch a parsed command to its handler.
///
/// When a record directory is configured, all port interactions are
/// recorded to per-port cassette files beneath it.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the handler fails.
pub fn dispatch(command: &Command, config: &Config) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;

    let Some(record_dir) = &config.record_dir else {
        let ctx = ServiceContext::live(config);
        return runtime.block_on(dispatch_with_context(command, &ctx, config));
    };

    let (ctx, session) = ServiceContext::recording_at(config, record_dir)?;
    let result = runtime.block_on(dispatch_with_context(command, &ctx, config));

    // Recording adapters hold the recorders; release them before finishing.
    drop(ctx);
    finish_recording(session)?;
    result
}

/// Dispatch a command with the given service context.
async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &Config,
) -> Result<(), String> {
    let output = match command {
        Command::Create { category, company, attributes } => {
            create::run(ctx, *category, company.as_deref(), attributes, config.create_attempts)
                .await?
        }
        Command::List { category, company } => list::run(ctx, *category, company).await?,
        Command::NextId { category } => next_id::run(ctx, *category).await?,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("Failed to render output: {e}"))?;
    println!("{json}");
    Ok(())
}

/// Formats a site error for the terminal, leading with its kind.
fn describe(err: &SiteError) -> String {
    let mut message = format!("{}: {err}", err.kind());
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    message
}

fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    tracing::info!(dir = %output_dir.display(), "recording saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StoreError;
    use crate::sites::SiteCategory;

    #[test]
    fn describe_includes_kind_and_cause_chain() {
        let err = SiteError::AllocationScan {
            category: SiteCategory::Production,
            source: StoreError::Backend { reason: "throttled".into() },
        };
        let text = describe(&err);
        assert!(text.starts_with("allocation_scan_failure:"));
        assert!(text.contains("caused by: store backend error: throttled"));
    }

    #[test]
    fn dispatch_against_a_fresh_store_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config { store_path: dir.path().join("sites.json"), ..Config::default() };
        let command = Command::NextId { category: SiteCategory::Consumption };
        assert!(dispatch(&command, &config).is_ok());
    }

    #[test]
    fn dispatch_records_cassettes_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            store_path: dir.path().join("sites.json"),
            record_dir: Some(dir.path().join("cassettes")),
            ..Config::default()
        };
        let command = Command::NextId { category: SiteCategory::Production };
        dispatch(&command, &config).unwrap();

        let sessions: Vec<_> =
            std::fs::read_dir(dir.path().join("cassettes")).unwrap().collect();
        assert_eq!(sessions.len(), 1);
        let session_dir = sessions[0].as_ref().unwrap().path();
        let store = std::fs::read_to_string(session_dir.join("store.cassette.yaml")).unwrap();
        assert!(store.contains("scan_attribute"));
    }
}
