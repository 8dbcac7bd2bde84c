use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sphere_trace::config::{OUTPUT_PATH, OUTPUT_VARIANT};
use sphere_trace::renderer::render_variant;

// One image per run: the configured variant, written to the working directory.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(variant = OUTPUT_VARIANT.name(), path = OUTPUT_PATH, "begin rendering");
    if let Err(e) = render_variant(OUTPUT_VARIANT, OUTPUT_PATH) {
        error!("{}", e);
        std::process::exit(1);
    }
}
