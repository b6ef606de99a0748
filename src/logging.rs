// SPDX-License-Identifier: GPL-3.0-only
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn filter_layer() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=warn",
        env!("CARGO_CRATE_NAME")
    )))
}

/// Console plus journald (when reachable) logging for the tray
pub fn setup_logs() {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer())
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer())
            .with(fmt_layer)
            .init();
    }
}

/// Journald-only logging for the helper.
///
/// The helper's stdout and stderr carry exactly one result line, so nothing
/// else may be written there. Without a journal the helper runs unlogged.
pub fn setup_helper_logs() {
    if let Ok(journal_layer) = tracing_journald::layer() {
        let journal_layer = journal_layer.with_syslog_identifier("nvidia-eject-helper".to_string());
        tracing_subscriber::registry()
            .with(filter_layer())
            .with(journal_layer)
            .init();
    }
}
