//! `textseal` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging on stderr.
//! 3. Build the [`Sealer`] and run the [`Menu`] on stdin/stdout.

use std::io;

use anyhow::Result;
use tracing::info;

use textseal::config::Config;
use textseal::menu::Menu;
use textseal::session::Sealer;
use textseal::telemetry;

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        max_plaintext_len = cfg.max_plaintext_len,
        nonce_mode = ?cfg.nonce_mode,
        "textseal starting"
    );

    // -----------------------------------------------------------------------
    // 3. Menu
    // -----------------------------------------------------------------------
    let sealer = Sealer::with_os_entropy(
        cfg.nonce_mode,
        cfg.associated_data.clone(),
        cfg.max_plaintext_len,
    );
    let stdin = io::stdin();
    let stdout = io::stdout();
    Menu::new(sealer, cfg.output_format, stdin.lock(), stdout.lock()).run()
}
