//! Bounded-concurrency batch runner
//!
//! Applies an async unit of work to every item, with at most
//! `concurrency` units in flight. Outcomes come back in input order and the
//! runner never inspects them: a failing item is just another outcome.

use std::future::Future;

use futures::stream::{self, StreamExt};

use crate::config::BatchConfig;

/// Run `work` over `items`, returning one output per item in input order
///
/// With `concurrency <= 1` items run strictly one after another and the
/// runner sleeps `delay` between an item finishing and the next one starting.
/// With higher concurrency `delay` is not applied; the cap alone throttles.
pub async fn batch_run<I, F, Fut>(items: I, config: BatchConfig, mut work: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    if config.concurrency <= 1 {
        let mut outputs = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 && !config.delay.is_zero() {
                tracing::debug!(
                    delay_ms = config.delay.as_millis(),
                    "Waiting before next batch item"
                );
                tokio::time::sleep(config.delay).await;
            }
            outputs.push(work(item).await);
        }
        return outputs;
    }

    // `buffered` polls at most `concurrency` futures and yields them in submission order
    stream::iter(items)
        .map(work)
        .buffered(config.concurrency)
        .collect()
        .await
}
