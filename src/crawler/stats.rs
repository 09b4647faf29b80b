//! Periodic progress reporting
//!
//! A side-effect-only monitor: it samples namespace sizes on an interval and
//! emits one human-readable line. Nothing in the crawl decision logic reads
//! these snapshots.

use crate::frontier::Frontier;
use crate::state::RunState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Widest host label printed in the stats line
const LABEL_WIDTH: usize = 17;

/// Shortens a base URL into the stats-line label: scheme stripped, truncated
pub fn host_label(base_url: &str) -> String {
    let label = base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    label.chars().take(LABEL_WIDTH).collect()
}

/// Emits one progress line from the current store and counter state
pub async fn print_stats(frontier: &Frontier, state: &RunState, base_url: &str) {
    let sizes = match frontier.sizes().await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("could not read namespace sizes: {}", e);
            return;
        }
    };

    tracing::info!(
        "[{}] parsed:{}, rate:{}/min, todo:{}, doing:{}, done:{}, trash:{}, errors:{}",
        host_label(base_url),
        state.parsed(),
        state.rate_per_minute(),
        sizes.todo,
        sizes.doing,
        sizes.done,
        sizes.trash,
        state.block_errors()
    );
}

/// Runs the stats monitor until the stop signal fires
pub async fn run_stats_monitor(
    frontier: Arc<Frontier>,
    state: Arc<RunState>,
    base_url: String,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.changed() => return,
        }
        print_stats(&frontier, &state, &base_url).await;
        if !state.is_running() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_label_strips_scheme() {
        assert_eq!(host_label("http://example.com"), "example.com");
        assert_eq!(host_label("https://example.com"), "example.com");
    }

    #[test]
    fn test_host_label_truncates() {
        let label = host_label("https://a-very-long-domain-name.example.com");
        assert_eq!(label.len(), 17);
        assert_eq!(label, "a-very-long-domai");
    }

    #[test]
    fn test_host_label_short_input() {
        assert_eq!(host_label("x.io"), "x.io");
    }
}
