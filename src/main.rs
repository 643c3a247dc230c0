//! `hive-payment` command line entrypoint.
//!
//! Pays hive node orders and inspects paid orders on Elastos Smart Chain,
//! signing with a private key from the configuration file.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `CONFIG` path of the JSON configuration file (or `--config`)
//! - `RUST_LOG` log filter, logs are written to stderr
//! - `OTEL_*` variables enable span export with the `telemetry` feature

mod run;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
