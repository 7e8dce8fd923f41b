//! Parallel dispatch of prompt batches.
//!
//! Adapters process one batch sequentially; this layer is where the model's
//! worker-count hint is honoured. Batches run concurrently, at most
//! `max_workers` at a time, and results are reassembled in input order.

use extract::{InferenceError, InferenceOverrides, LanguageModel, ScoredOutput};
use futures::{stream, StreamExt, TryStreamExt};

/// Runs `prompts` through `model` in batches of `batch_size`, returning one
/// output group per prompt in input order.
///
/// Fails with the first error in input order; batches after a failing one may
/// still have been sent.
pub async fn run_batches(
    model: &dyn LanguageModel,
    prompts: Vec<String>,
    batch_size: usize,
    overrides: &InferenceOverrides,
) -> Result<Vec<Vec<ScoredOutput>>, InferenceError> {
    let workers = model.max_workers().get();
    let batches: Vec<Vec<String>> = prompts
        .chunks(batch_size.max(1))
        .map(<[String]>::to_vec)
        .collect();

    tracing::info!(
        model_id = %model.model_id(),
        prompts = prompts.len(),
        batches = batches.len(),
        workers,
        "dispatching prompts"
    );

    let grouped: Vec<Vec<Vec<ScoredOutput>>> = stream::iter(batches)
        .map(|batch| model.infer(batch, overrides.clone()).try_collect::<Vec<_>>())
        .buffered(workers)
        .try_collect()
        .await?;

    Ok(grouped.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use extract::{FormatType, InferenceStream, ModelId, WorkerCount};

    use super::*;

    /// Echoes prompts after a delay that shrinks with position, so later
    /// batches finish first when run concurrently.
    struct Echo {
        model_id: ModelId,
        workers: WorkerCount,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl Echo {
        fn new(workers: usize) -> Self {
            Self {
                model_id: ModelId::new("echo").unwrap(),
                workers: WorkerCount::new(workers).unwrap(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    impl LanguageModel for Echo {
        fn model_id(&self) -> &ModelId {
            &self.model_id
        }

        fn format_type(&self) -> FormatType {
            FormatType::Text
        }

        fn max_workers(&self) -> WorkerCount {
            self.workers
        }

        fn infer<'a>(&'a self, prompts: Vec<String>, _: InferenceOverrides) -> InferenceStream<'a> {
            Box::pin(stream::iter(prompts).then(move |prompt| async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);

                let delay = 40u64.saturating_sub(prompt.len() as u64 * 5);
                tokio::time::sleep(Duration::from_millis(delay)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                if prompt == "boom" {
                    return Err(InferenceError::configuration("boom"));
                }
                Ok(vec![ScoredOutput::certain(prompt.to_uppercase())])
            }))
        }
    }

    fn prompts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let model = Echo::new(3);
        let results = run_batches(
            &model,
            prompts(&["a", "bb", "ccc", "dddd", "eeeee"]),
            2,
            &InferenceOverrides::default(),
        )
        .await
        .unwrap();

        let outputs: Vec<&str> = results.iter().map(|g| g[0].output.as_str()).collect();
        assert_eq!(outputs, vec!["A", "BB", "CCC", "DDDD", "EEEEE"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_worker_hint() {
        let model = Echo::new(2);
        run_batches(
            &model,
            prompts(&["a", "b", "c", "d", "e", "f"]),
            1,
            &InferenceOverrides::default(),
        )
        .await
        .unwrap();

        let peak = model.peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak concurrency {peak} exceeds worker hint");
        assert!(peak >= 1);
    }

    #[tokio::test]
    async fn test_first_error_is_returned() {
        let model = Echo::new(4);
        let err = run_batches(
            &model,
            prompts(&["a", "boom", "c"]),
            1,
            &InferenceOverrides::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "boom");
    }
}
