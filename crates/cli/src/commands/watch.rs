//! Live cart badge.
//!
//! Prints the badge label whenever another process changes the cart, until
//! Ctrl-C.
//!
//! # Usage
//!
//! ```bash
//! # Terminal 1
//! arwa watch
//!
//! # Terminal 2
//! arwa add 1 --catalog products.json
//! ```

use std::error::Error;

use arwa_shop_cart::{CartBadge, badge_label};
use tracing::{debug, info};

use crate::config::CartConfig;

/// Watch the cart until interrupted.
///
/// # Errors
///
/// Returns an error if the data directory cannot be opened or polled.
#[allow(clippy::print_stdout)]
pub async fn run(config: &CartConfig) -> Result<(), Box<dyn Error>> {
    let store = config.open_store()?;
    let badge = CartBadge::attach_with(&store, |count| println!("{}", badge_label(count)));
    println!("{}", badge.label());

    info!(
        dir = %store.storage().dir().display(),
        interval = ?config.watch_interval,
        "watching cart, press Ctrl-C to stop"
    );

    let mut ticker = tokio::time::interval(config.watch_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let storage = store.storage().clone();
                let changes = tokio::task::spawn_blocking(move || storage.poll()).await??;
                if changes > 0 {
                    debug!(changes, "storage changed");
                }
            }
            result = &mut shutdown => {
                result?;
                info!("stopping watch");
                break;
            }
        }
    }

    drop(badge);
    Ok(())
}
