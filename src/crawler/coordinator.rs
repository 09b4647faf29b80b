//! Crawl coordination: the public `Crawler` API and the dispatcher loop
//!
//! The dispatcher is a single control loop over the frontier store. Each
//! cycle it applies backpressure against the `doing` namespace, checks for
//! quiescence, and otherwise claims a random batch from `todo` and hands the
//! keys to the worker pool over a bounded channel. Sending on that channel
//! blocks while every worker is busy, which is the only flow control between
//! dispatch rate and worker throughput.

use crate::config::{Config, CrawlerConfig, Settings};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::stats::{print_stats, run_stats_monitor};
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::extract::DataExtractor;
use crate::frontier::{EnqueueMode, Frontier, Namespace};
use crate::state::RunState;
use crate::{QuarryError, Result};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// The crawler instance
///
/// Construction connects to the store and resolves the run settings; the
/// crawl itself starts with [`Crawler::run`].
pub struct Crawler {
    config: Arc<CrawlerConfig>,
    settings: Arc<Settings>,
    frontier: Arc<Frontier>,
    client: Client,
    extractor: Option<Arc<DataExtractor>>,
    state: Arc<RunState>,
}

impl Crawler {
    /// Connects to the store and prepares a crawler
    ///
    /// When the config carries a `[scope]` section, those settings are
    /// persisted into the store for other processes; otherwise the settings
    /// previously persisted by some earlier process are loaded. Failing both
    /// is a configuration error surfaced before any crawling begins, as is
    /// an unreachable store.
    pub async fn new(config: Config, config_hash: Option<String>) -> Result<Self> {
        let frontier = match config.store.kind.as_str() {
            "memory" => Arc::new(Frontier::in_memory()),
            _ => Arc::new(Frontier::open_redis(&config.store.url).await?),
        };

        let settings = match config.scope {
            Some(scope) => {
                frontier.save_settings(&scope, config_hash).await?;
                tracing::info!("saved settings for {}", scope.base_url);
                scope
            }
            None => {
                let stored = frontier
                    .load_settings()
                    .await?
                    .ok_or(QuarryError::NoSettings)?;
                tracing::info!(
                    "loaded settings for {} (saved {})",
                    stored.settings.base_url,
                    stored.saved_at
                );
                if let (Some(ours), Some(theirs)) = (&config_hash, &stored.config_hash) {
                    if ours != theirs {
                        tracing::warn!("config file differs from the one that seeded this crawl");
                    }
                }
                stored.settings
            }
        };

        let extractor = if settings.pluck_rules.is_empty() {
            None
        } else {
            Some(Arc::new(DataExtractor::from_rules(&settings.pluck_rules)?))
        };

        let client = build_http_client(&config.crawler)?;

        let state = Arc::new(RunState::new(config.crawler.max_block_errors));

        Ok(Self {
            config: Arc::new(config.crawler),
            settings: Arc::new(settings),
            frontier,
            client,
            extractor,
            state,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.state
    }

    /// Adds seed URLs to the frontier
    ///
    /// Returns how many were actually inserted (deduplicated seeds are
    /// silently skipped under [`EnqueueMode::Dedup`]).
    pub async fn add_seeds(&self, seeds: &[String], mode: EnqueueMode) -> Result<usize> {
        let mut added = 0;
        for seed in seeds {
            if self.frontier.enqueue(seed, mode).await? {
                added += 1;
            }
        }
        tracing::info!("added {} of {} seed links", added, seeds.len());
        Ok(added)
    }

    /// Runs the crawl until quiescence, an external stop, or a fatal error
    pub async fn run(&self) -> Result<()> {
        tracing::info!("starting crawl on {}", self.settings.base_url);
        tracing::debug!("settings: {:?}", self.settings);

        // Capacity 1: a handoff, not a queue. Depth is bounded by the store's
        // `doing` namespace, not by buffering in the process.
        let (job_tx, job_rx) = mpsc::channel::<String>(1);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (stop_tx, stop_rx) = watch::channel(false);

        let ctx = WorkerContext {
            frontier: Arc::clone(&self.frontier),
            client: self.client.clone(),
            settings: Arc::clone(&self.settings),
            extractor: self.extractor.clone(),
            state: Arc::clone(&self.state),
            cookie: self.config.cookie.clone(),
        };

        let mut workers = Vec::with_capacity(self.config.workers);
        for id in 0..self.config.workers {
            workers.push(tokio::spawn(run_worker(
                id,
                Arc::clone(&job_rx),
                stop_rx.clone(),
                ctx.clone(),
            )));
        }

        let stats = tokio::spawn(run_stats_monitor(
            Arc::clone(&self.frontier),
            Arc::clone(&self.state),
            self.settings.base_url.clone(),
            Duration::from_secs(self.config.stats_interval),
            stop_rx,
        ));

        let result = self.dispatch(&job_tx).await;

        // Closing the channel drains the workers; the stop signal covers any
        // worker still parked on the receiver.
        drop(job_tx);
        self.state.stop();
        let _ = stop_tx.send(true);
        for worker in workers {
            let _ = worker.await;
        }
        let _ = stats.await;

        print_stats(&self.frontier, &self.state, &self.settings.base_url).await;
        tracing::info!("finished crawling");
        result
    }

    /// The dispatcher loop
    ///
    /// Steady-state store errors are logged and the cycle is abandoned; only
    /// a fatal error recorded by a worker (the block circuit breaker) or an
    /// external stop ends the loop besides quiescence.
    async fn dispatch(&self, jobs: &mpsc::Sender<String>) -> Result<()> {
        let poll = Duration::from_millis(self.config.poll_interval_ms);
        let grace = poll * 3;
        let mut have_results = true;

        loop {
            tokio::time::sleep(poll).await;

            if let Some(err) = self.state.take_fatal() {
                tracing::error!("aborting crawl: {}", err);
                return Err(err);
            }
            if !self.state.is_running() {
                tracing::info!("stop requested, winding down");
                return Ok(());
            }

            // Backpressure: cap the number of in-flight keys regardless of
            // how fast batches are being claimed.
            let doing = match self.frontier.size(Namespace::Doing).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("could not read doing size: {}", e);
                    continue;
                }
            };
            if doing > self.config.max_in_flight {
                tokio::time::sleep(grace).await;
                continue;
            }

            let todo = match self.frontier.size(Namespace::Todo).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!("could not read todo size: {}", e);
                    continue;
                }
            };

            // Two-phase quiescence: workers may be mid-flight and about to
            // enqueue new candidates, so an empty todo only counts after it
            // is observed again past a grace wait.
            if todo == 0 {
                tokio::time::sleep(grace).await;
                if have_results {
                    have_results = false;
                    continue;
                }
                tracing::info!("no more work to do");
                return Ok(());
            }
            tracing::debug!("found {} urls todo", todo);
            have_results = true;

            let sample = match self.frontier.sample_todo(self.config.workers).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::error!("could not sample todo: {}", e);
                    continue;
                }
            };
            if sample.is_empty() {
                continue;
            }

            let batch: Vec<String> = sample.into_iter().collect();
            tracing::debug!("moving {} urls from todo to doing", batch.len());
            if let Err(e) = self.frontier.move_to_doing(&batch).await {
                tracing::error!("could not move batch to doing: {}", e);
                continue;
            }

            for url in batch {
                if jobs.send(url).await.is_err() {
                    // All workers are gone; nothing left to dispatch to.
                    return Ok(());
                }
            }
        }
    }

    /// Moves everything in `doing` and `trash` back to `todo`
    ///
    /// Normal startup path after a crash or an abandoned run, not an
    /// exceptional one.
    pub async fn requeue_in_flight(&self) -> Result<u64> {
        let moved = self.frontier.restore_in_flight().await?;
        tracing::info!("restored {} urls to todo", moved);
        Ok(moved)
    }

    /// All keys known to the frontier, across all four namespaces
    pub async fn export_all(&self) -> Result<Vec<String>> {
        Ok(self.frontier.export_all().await?)
    }

    /// URL to extracted-payload mapping for completed pages
    pub async fn export_done(&self) -> Result<HashMap<String, String>> {
        Ok(self.frontier.export_done().await?)
    }

    /// Erases the four URL namespaces
    pub async fn flush(&self) -> Result<()> {
        self.frontier.flush().await?;
        tracing::info!("flushed the frontier");
        Ok(())
    }

    /// Seeds the base URL into the frontier
    ///
    /// Forced: restarting a crawl re-fetches the entry page even when a
    /// previous run already completed it.
    pub async fn seed_base_url(&self) -> Result<()> {
        tracing::info!("adding {} to todo", self.settings.base_url);
        self.frontier
            .enqueue(&self.settings.base_url, EnqueueMode::Force)
            .await?;
        Ok(())
    }
}
