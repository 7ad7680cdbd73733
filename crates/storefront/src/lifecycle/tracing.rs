//! # Logging
//!
//! [`setup_tracing`] installs a compact `tracing` subscriber filtered by `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run      # checkout states, created records, compensation
//! RUST_LOG=debug cargo run     # every store request, CAS conflicts, retries
//! ```
//!
//! Checkout logs carry the span of [`OrderCoordinator::checkout`](crate::checkout::OrderCoordinator::checkout),
//! so every line of one checkout shows its `user_id` and idempotency `key`:
//!
//! ```text
//! INFO checkout{user_id=user_1 key=…}: Checkout state changed state=reserving
//! INFO checkout{user_id=user_1 key=…}:reserve: Stock written id=product_1 op="reserve"
//! WARN checkout{user_id=user_1 key=…}: Releasing reserved stock product_id=product_1 size=M quantity=1
//! ```
//!
//! Compensation is logged at `warn`; a failure that could not be undone at `error`.

/// Installs the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
