// ABOUTME: Logging setup for the web2api binary: tracing-subscriber writing to stderr.
// ABOUTME: RUST_LOG selects the filter; WEB2API_LOG_FORMAT=json switches to JSON lines.

/// Initialize tracing according to `RUST_LOG` and `WEB2API_LOG_FORMAT`.
/// Defaults to `info` when `RUST_LOG` is unset.
pub fn init_tracing() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    match std::env::var("WEB2API_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            let _ = builder.with(fmt_layer.compact()).try_init();
        }
    }
}
