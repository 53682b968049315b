use tracing::Subscriber;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, one line per event with the active scan span.
    #[default]
    Compact,
    /// JSON lines for schedulers and cluster log collectors.
    Json,
}

/// 未設定 RUST_LOG 時的預設過濾規則
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "mesh_batch=debug,info"
    } else {
        "mesh_batch=info"
    }
}

/// JSON layer; event fields are flattened and the current scan span is
/// attached under `span`.
pub fn json_layer<S, W>(writer: W) -> fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_target(false)
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(writer)
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    // 每筆 scan 日誌都帶著 scan span 的 dataset / scan / gs_port 欄位
    let (compact, json) = match format {
        LogFormat::Compact => (
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            ),
            None,
        ),
        LogFormat::Json => (None, Some(json_layer(std::io::stdout))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "mesh_batch=info");
        assert_eq!(default_directives(true), "mesh_batch=debug,info");
        assert!(default_directives(true).parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn test_default_format_is_compact() {
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }
}
