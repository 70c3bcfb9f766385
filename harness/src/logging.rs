//! Logging setup for matbench.
//!
//! Built on the `log` facade with `env_logger` as the backend.
//!
//! # Levels
//!
//! - `error!` - failures that abort a run
//! - `warn!` - suspicious input that was corrected (e.g. clamped sample counts)
//! - `info!` - run phases (device selection, warm-up, timed phase)
//! - `debug!` - per-iteration detail
//! - `trace!` - per-check detail
//!
//! `RUST_LOG` is honoured by [`init_from_env`]:
//!
//! ```bash
//! RUST_LOG=info matbench run
//! RUST_LOG=harness::runner=debug matbench run --iterations 100
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging at `Warn`. Later calls are no-ops.
pub fn init() {
    init_with_level(LevelFilter::Warn);
}

/// Initialize logging with a specific level. Later calls are no-ops.
pub fn init_with_level(level: LevelFilter) {
    INIT.call_once(|| {
        Builder::new()
            .filter_level(level)
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{:5}] {} - {}",
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .init();
    });
}

/// Initialize logging from `RUST_LOG`, defaulting to `warn`.
pub fn init_from_env() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    });
}

/// Map a `-v` count to a level: none is `Warn`, one is `Info`, more is `Debug`.
pub fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test() {
    let _ = env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .is_test(true)
        .try_init();
}
