//! Periodic pod list refresh for the `watch` command.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Credential;
use crate::error::Result;
use crate::runpod::{ListPodsOutcome, PodActionController, PodSnapshot};

/// Refreshes the pod list every `period` until `shutdown` resolves.
///
/// `shutdown` is polled while waiting for the next tick and while a refresh
/// is in flight, so a stalled provider never delays the exit. An interrupted
/// refresh is dropped and not reported. `on_refresh` receives each outcome
/// together with the controller's snapshot after it was applied.
///
/// Returns the number of completed refreshes.
///
/// # Errors
///
/// Returns the first error produced by `on_refresh`.
pub async fn watch_until<S, F>(
    controller: &PodActionController,
    credential: &Credential,
    period: Duration,
    shutdown: S,
    mut on_refresh: F,
) -> Result<usize>
where
    S: Future<Output = ()>,
    F: FnMut(&ListPodsOutcome, &PodSnapshot) -> Result<()>,
{
    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(period);
    let mut refreshes = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            () = &mut shutdown => break,
        }

        let outcome = tokio::select! {
            outcome = controller.refresh(credential) => outcome,
            () = &mut shutdown => {
                debug!("Shutdown during refresh, dropping it");
                break;
            }
        };

        refreshes += 1;
        on_refresh(&outcome, &controller.snapshot())?;
    }

    info!(refreshes, "Stopped watching");
    Ok(refreshes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunPodError;
    use crate::runpod::{GraphQLRequest, RunPodClient, Transport};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    /// Provider that never answers.
    struct StalledProvider;

    #[async_trait]
    impl Transport for StalledProvider {
        async fn send(
            &self,
            _endpoint: &str,
            _credential: &Credential,
            _request: &GraphQLRequest,
        ) -> std::result::Result<Value, RunPodError> {
            std::future::pending().await
        }
    }

    /// Provider that always lists one running pod.
    struct OnePodProvider;

    #[async_trait]
    impl Transport for OnePodProvider {
        async fn send(
            &self,
            _endpoint: &str,
            _credential: &Credential,
            _request: &GraphQLRequest,
        ) -> std::result::Result<Value, RunPodError> {
            Ok(json!({ "myself": { "pods": [
                { "id": "p1", "name": "trainer", "desiredStatus": "RUNNING", "runtime": null }
            ] } }))
        }
    }

    fn controller_over(transport: Arc<dyn Transport>) -> PodActionController {
        PodActionController::new(RunPodClient::with_transport(transport, "http://runpod.test"))
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_stalled_refresh() {
        let controller = controller_over(Arc::new(StalledProvider));
        let credential = Credential::new("key");

        let watched = tokio::time::timeout(
            Duration::from_secs(5),
            watch_until(
                &controller,
                &credential,
                Duration::from_secs(60),
                tokio::time::sleep(Duration::from_millis(20)),
                |_, _| panic!("no refresh should complete"),
            ),
        )
        .await
        .expect("watch should stop on shutdown");

        assert_eq!(watched.expect("watch should succeed"), 0);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_refreshes_until_shutdown() {
        let controller = controller_over(Arc::new(OnePodProvider));
        let credential = Credential::new("key");
        let (stop, stopped) = oneshot::channel::<()>();
        let mut stop = Some(stop);
        let mut seen = Vec::new();

        let refreshes = watch_until(
            &controller,
            &credential,
            Duration::from_millis(5),
            async {
                let _ = stopped.await;
            },
            |outcome, snapshot| {
                assert!(outcome.error().is_none());
                seen.push(snapshot.pods.len());
                if seen.len() == 2 {
                    if let Some(stop) = stop.take() {
                        let _ = stop.send(());
                    }
                }
                Ok(())
            },
        )
        .await
        .expect("watch should succeed");

        assert_eq!(refreshes, 2);
        assert_eq!(seen, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_callback_error_stops_watch() {
        let controller = controller_over(Arc::new(OnePodProvider));
        let credential = Credential::new("key");

        let result = watch_until(
            &controller,
            &credential,
            Duration::from_millis(5),
            std::future::pending(),
            |_, _| Err(std::io::Error::other("stdout closed").into()),
        )
        .await;

        assert!(result.is_err());
    }
}
