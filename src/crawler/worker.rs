//! Worker loop: fetch, classify, and apply the frontier transition
//!
//! Workers share one job receiver behind an async mutex; each claimed URL
//! runs through fetch & classify, then exactly one frontier transition:
//! requeue (transient), discard (permanent), or complete plus candidate
//! enqueueing (success).

use crate::config::Settings;
use crate::crawler::fetcher::{fetch_url, FetchOutcome};
use crate::extract::{extract_links, DataExtractor};
use crate::frontier::{EnqueueMode, Frontier};
use crate::state::RunState;
use crate::url::filter_links;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};

/// Everything a worker needs, shared across the pool
#[derive(Clone)]
pub struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub client: Client,
    pub settings: Arc<Settings>,
    pub extractor: Option<Arc<DataExtractor>>,
    pub state: Arc<RunState>,
    pub cookie: String,
}

/// Runs one worker until the job channel closes or the stop signal fires
pub async fn run_worker(
    id: usize,
    jobs: Arc<Mutex<mpsc::Receiver<String>>>,
    mut stop: watch::Receiver<bool>,
    ctx: WorkerContext,
) {
    tracing::debug!("initiated worker {}", id);
    loop {
        let url = {
            let mut rx = jobs.lock().await;
            tokio::select! {
                job = rx.recv() => match job {
                    Some(url) => url,
                    None => break,
                },
                _ = stop.changed() => break,
            }
        };
        process_url(id, &url, &ctx).await;
    }
    tracing::debug!("worker {} exiting", id);
}

/// Processes one claimed URL through fetch & classify and the frontier
async fn process_url(id: usize, url: &str, ctx: &WorkerContext) {
    tracing::debug!("worker #{} processing {}", id, url);
    let started = std::time::Instant::now();

    match fetch_url(&ctx.client, url, &ctx.cookie).await {
        FetchOutcome::Transport { error } => {
            tracing::warn!(
                "worker #{} failed fetching {}, will retry: {}",
                id,
                url,
                error
            );
            if let Err(e) = ctx.frontier.requeue(url).await {
                tracing::error!("worker #{} could not requeue {}: {}", id, url, e);
            }
        }

        FetchOutcome::Blocked { status } => {
            let count = ctx.state.record_block();
            tracing::warn!(
                "worker #{} got {} for {} ({} consecutive blocks)",
                id,
                status,
                url,
                count
            );
            if let Err(e) = ctx.frontier.discard(url).await {
                tracing::error!("worker #{} could not discard {}: {}", id, url, e);
            }
        }

        FetchOutcome::HttpError { status } => {
            tracing::debug!("worker #{} got {} for {}, trashing", id, status, url);
            if let Err(e) = ctx.frontier.discard(url).await {
                tracing::error!("worker #{} could not discard {}: {}", id, url, e);
            }
        }

        FetchOutcome::Success { body } => {
            ctx.state.reset_blocks();

            let plucked = match &ctx.extractor {
                Some(extractor) => extractor.run(&body),
                None => String::new(),
            };

            // The page itself was reachable, so a missing extraction under
            // the require-extraction policy is a transient failure.
            if ctx.settings.require_extraction && ctx.extractor.is_some() && plucked.is_empty() {
                tracing::warn!("worker #{} plucked nothing from {}, will retry", id, url);
                if let Err(e) = ctx.frontier.requeue(url).await {
                    tracing::error!("worker #{} could not requeue {}: {}", id, url, e);
                }
                return;
            }

            let candidates = if ctx.settings.dont_follow_links {
                Vec::new()
            } else {
                filter_links(&extract_links(&body), &ctx.settings)
            };

            if let Err(e) = ctx.frontier.complete(url, &plucked).await {
                tracing::warn!("worker #{} could not complete {}: {}", id, url, e);
                return;
            }

            for link in &candidates {
                if let Err(e) = ctx.frontier.enqueue(link, EnqueueMode::Dedup).await {
                    tracing::warn!("worker #{} could not enqueue {}: {}", id, link, e);
                }
            }

            tracing::debug!(
                "worker #{}: {} candidates and {} bytes plucked from {} [{:?}]",
                id,
                candidates.len(),
                plucked.len(),
                url,
                started.elapsed()
            );
            ctx.state.record_parsed();
        }
    }
}
