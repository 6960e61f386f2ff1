//! Print revenue projections for a mite account.
//!
//! ```sh
//! export MITE_ACCOUNT=acme
//! export MITE_API_KEY=...
//! cargo run --bin revenue-projection -- 2024
//! ```
//!
//! The year defaults to the current one.

use chrono::{Datelike, Utc};

use mite_api::revenue::{financial_metrics, pretty_number, DEFAULT_DELIMITER};
use mite_api::{Mite, MiteConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let now = Utc::now();
    let year = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<i32>().unwrap_or_else(|_| {
            eprintln!("Error: '{arg}' is not a year");
            std::process::exit(2);
        }),
        None => now.year(),
    };

    let config = MiteConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!();
        eprintln!("  export MITE_ACCOUNT=<your account>");
        eprintln!("  export MITE_API_KEY=<your API key>");
        std::process::exit(1);
    });

    let mite = Mite::new(config).unwrap_or_else(|e| {
        eprintln!("Error: Failed to create client: {e}");
        std::process::exit(1);
    });

    let projection = financial_metrics(&mite, year, now)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Failed to fetch time entries: {e}");
            std::process::exit(1);
        });

    println!("Revenue projection for {year}\n");
    println!(
        "  linear:             {}",
        pretty_number(projection.per_year, DEFAULT_DELIMITER)
    );
    println!(
        "  last 4 weeks' rate: {}",
        pretty_number(projection.per_last_4_weeks, DEFAULT_DELIMITER)
    );
    println!(
        "  last 7 days' rate:  {}",
        pretty_number(projection.per_last_7_days, DEFAULT_DELIMITER)
    );
}
