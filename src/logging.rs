use crate::utils::truncate_str;
use crate::{Preview, PreviewError};
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const CARD_WIDTH: usize = 72;
const LABEL_WIDTH: usize = 14;
// `║ ` + label + ` ` + value + ` ║`
const VALUE_WIDTH: usize = CARD_WIDTH - LABEL_WIDTH - 5;

#[derive(Debug)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub console_output: bool,
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".into(),
            log_level: "info".into(),
            console_output: true,
            file_output: true,
        }
    }
}

fn card_line(label: &str, value: &str) -> String {
    format!(
        "║ {:<label$} {:<value$} ║\n",
        truncate_str(label, LABEL_WIDTH),
        truncate_str(value, VALUE_WIDTH),
        label = LABEL_WIDTH,
        value = VALUE_WIDTH
    )
}

fn card(rows: &[(String, String)]) -> String {
    let border = "═".repeat(CARD_WIDTH - 2);
    let mut out = format!("╔{border}╗\n");
    for (label, value) in rows {
        out.push_str(&card_line(label, value));
    }
    out.push_str(&format!("╚{border}╝"));
    out
}

/// Boxed summary of a preview: one row per field, one row per image and per
/// extra OpenGraph property. Long values are cut to the card width.
pub fn format_preview_card(preview: &Preview, requested_url: &str) -> String {
    let mut rows = vec![
        ("Requested".to_string(), requested_url.to_string()),
        ("URL".to_string(), preview.url.clone()),
        ("Title".to_string(), preview.title.clone()),
        (
            "Desc".to_string(),
            preview.description.clone().unwrap_or_else(|| "N/A".into()),
        ),
    ];
    if preview.images.is_empty() {
        rows.push(("Image".to_string(), "N/A".to_string()));
    }
    rows.extend(
        preview
            .images
            .iter()
            .map(|image| ("Image".to_string(), image.src.clone())),
    );
    rows.extend(
        preview
            .extra
            .iter()
            .map(|(name, value)| (format!("og:{name}"), value.clone())),
    );
    card(&rows)
}

/// Boxed summary of a failed preview, tagged with how a request boundary
/// should report it.
pub fn format_error_card(url: &str, error: &PreviewError) -> String {
    let outcome = if error.is_not_found() {
        "not found"
    } else {
        "failed"
    };
    card(&[
        ("URL".to_string(), url.to_string()),
        ("Outcome".to_string(), outcome.to_string()),
        ("Error".to_string(), error.to_string()),
    ])
}

pub fn log_preview_card(preview: &Preview, requested_url: &str) {
    info!("\n{}", format_preview_card(preview, requested_url));
}

pub fn log_error_card(url: &str, error: &PreviewError) {
    error!("\n{}", format_error_card(url, error));
}

/// Installs the global subscriber: a pretty console layer and/or a daily
/// rolling file under `log_dir`. `RUST_LOG` overrides `log_level`.
pub fn setup_logging(config: LogConfig) -> std::io::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let mut layers = Vec::new();

    if config.console_output {
        let console_layer = subscriber_fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_span_events(subscriber_fmt::format::FmtSpan::CLOSE)
            .pretty();
        layers.push(console_layer.boxed());
    }

    if config.file_output {
        std::fs::create_dir_all(&config.log_dir)?;

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_dir, "link-preview.log");

        let file_layer = subscriber_fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_writer(file_appender);

        layers.push(file_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::AlreadyExists, e))?;

    debug!("Logging system initialized with config: {:?}", config);
    Ok(())
}
