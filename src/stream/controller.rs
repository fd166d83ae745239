use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use futures_util::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::chain::ChainReader;
use crate::classify;
use crate::config::StreamConfig;
use crate::core::{
    FilterCriteria, ResolvedTransaction, SignatureInfo, StreamError, TransactionEvent,
};
use crate::filter;
use crate::reference::{ReferenceSource, TokenRegistry};

/// Subscriber callback. Invoked at most once per qualifying event, in the
/// chain reader's signature order, never after cancellation.
pub type EventCallback = Arc<dyn Fn(TransactionEvent) + Send + Sync>;

/// Cancellation handle returned to the caller of [`stream_transactions`].
///
/// `stop` is cooperative and idempotent: it takes effect before the next
/// suspension point, and in-flight resolutions that complete afterwards are
/// discarded without reaching the subscriber.
#[derive(Clone)]
pub struct StreamHandle {
    cancelled: Arc<AtomicBool>,
}

impl StreamHandle {
    pub fn stop(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            debug!("Stream session cancellation requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// One independent polling subscription.
///
/// Owns its deduplication set and cancellation flag exclusively; concurrent
/// sessions share nothing mutable. The loop alternates Polling and Delay
/// states until the handle is stopped; a failed cycle delays for the longer
/// backoff interval instead of the poll interval, and never terminates the
/// session on its own.
pub struct StreamSession {
    reader: Arc<dyn ChainReader>,
    reference: Arc<dyn ReferenceSource>,
    registry: Arc<TokenRegistry>,
    config: StreamConfig,
    criteria: FilterCriteria,
    on_event: EventCallback,
    /// Signatures already processed in this session.
    // TODO: bound this set once sessions are expected to run for days.
    seen: HashSet<String>,
    cancelled: Arc<AtomicBool>,
}

impl StreamSession {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        reference: Arc<dyn ReferenceSource>,
        registry: Arc<TokenRegistry>,
        config: StreamConfig,
        criteria: FilterCriteria,
        on_event: EventCallback,
    ) -> Self {
        Self {
            reader,
            reference,
            registry,
            config,
            criteria,
            on_event,
            seen: HashSet::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cancellation handle for this session. Safe to clone and to call from
    /// any task.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle {
            cancelled: self.cancelled.clone(),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Runs the polling loop until cancelled.
    #[instrument(skip(self), fields(watch_address = %self.config.watch_address))]
    pub async fn run(mut self) {
        info!(
            signature_limit = self.config.signature_limit,
            poll_interval_secs = self.config.poll_interval_secs,
            error_backoff_secs = self.config.error_backoff_secs,
            "Stream session starting"
        );

        let mut cycle = 0u64;
        loop {
            if self.is_cancelled() {
                break;
            }
            cycle += 1;

            let delay = match self.run_cycle().await {
                Ok(emitted) => {
                    debug!(cycle = cycle, emitted = emitted, "Poll cycle completed");
                    self.config.poll_interval()
                }
                Err(e) => {
                    warn!(cycle = cycle, error = %e, "Poll cycle failed, backing off");
                    self.config.error_backoff()
                }
            };

            if self.is_cancelled() {
                break;
            }
            sleep(delay).await;
        }

        info!(cycles = cycle, "Stream session stopped");
    }

    /// One fetch-classify-filter-emit pass. Returns the number of events
    /// emitted, or the transport error that should trigger backoff.
    async fn run_cycle(&mut self) -> Result<usize, StreamError> {
        let signatures = self
            .reader
            .fetch_recent_signatures(&self.config.watch_address, self.config.signature_limit)
            .await?;

        let fresh: Vec<SignatureInfo> = signatures
            .into_iter()
            .filter(|info| !self.seen.contains(&info.signature))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        // Cancellation means no further network calls: re-check before
        // dispatching the per-signature resolutions.
        if self.is_cancelled() {
            return Ok(0);
        }

        // Resolve concurrently; join_all yields results in input order, so
        // emission below preserves the reader's most-recent-first ordering.
        let resolutions = join_all(
            fresh
                .iter()
                .map(|info| self.reader.fetch_parsed_transaction(&info.signature)),
        )
        .await;

        let mut emitted = 0;
        for (info, resolution) in fresh.iter().zip(resolutions) {
            let tx = match resolution {
                Ok(Some(tx)) => {
                    self.seen.insert(info.signature.clone());
                    tx
                }
                Ok(None) => {
                    // Pruned or unindexed; nothing more to learn about it.
                    self.seen.insert(info.signature.clone());
                    debug!(signature = %info.signature, "Transaction unavailable, skipping");
                    continue;
                }
                Err(e) if e.is_retryable() => {
                    // Leave this and later signatures out of the dedup set so
                    // the next cycle retries them.
                    return Err(e);
                }
                Err(e) => {
                    self.seen.insert(info.signature.clone());
                    debug!(signature = %info.signature, error = %e, "Skipping unclassifiable transaction");
                    continue;
                }
            };

            if let Some(event) = self.evaluate_transaction(tx, info.block_time).await {
                if self.is_cancelled() {
                    debug!("Cancelled mid-cycle, discarding remaining events");
                    break;
                }
                (self.on_event)(event);
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// Classifies a resolved transaction, enriches it with reference data, and
    /// applies the session's filter. `None` means "does not qualify", for any
    /// reason, including classification failures.
    async fn evaluate_transaction(
        &self,
        tx: ResolvedTransaction,
        block_time: Option<i64>,
    ) -> Option<TransactionEvent> {
        if !classify::is_purchase(&tx) {
            return None;
        }

        let amount_sol = classify::estimate_value(&tx);
        let token_symbol = classify::resolve_token_symbol(&tx, &self.registry);
        let market_cap = self
            .reference
            .reference_for(&token_symbol)
            .await
            .and_then(|reference| reference.market_cap);

        let timestamp = block_time
            .or(tx.block_time)
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now);

        let event = TransactionEvent {
            id: tx.signature.clone(),
            wallet_address: tx.fee_payer.clone(),
            token_symbol,
            amount_sol,
            market_cap,
            timestamp,
            tx_signature: tx.signature,
        };

        filter::matches(&event, &self.criteria).then_some(event)
    }
}

/// Starts a streaming session and returns its cancellation handle.
///
/// The session polls `config.watch_address`, emits qualifying events through
/// `on_event`, and keeps retrying transient RPC failures with a fixed longer
/// delay. The subscriber never observes errors; degraded freshness during
/// backoff is the only visible effect of failures.
pub fn stream_transactions<F>(
    reader: Arc<dyn ChainReader>,
    reference: Arc<dyn ReferenceSource>,
    registry: Arc<TokenRegistry>,
    config: StreamConfig,
    criteria: FilterCriteria,
    on_event: F,
) -> StreamHandle
where
    F: Fn(TransactionEvent) + Send + Sync + 'static,
{
    let session = StreamSession::new(
        reader,
        reference,
        registry,
        config,
        criteria,
        Arc::new(on_event),
    );
    let handle = session.handle();
    tokio::spawn(session.run());
    handle
}
