//! Polling watcher behind the organizer overview.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use shared::OverviewResponse;

use crate::api::RegistrationApi;

/// Refresh interval used by the overview page
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically fetches the aggregate view and publishes each snapshot.
///
/// The first fetch happens immediately, then once per interval. The task
/// keeps running until `cancel` (or drop) aborts it, so a closed view never
/// leaves orphaned polling behind.
pub struct OverviewWatcher {
    task: JoinHandle<()>,
    receiver: watch::Receiver<Option<OverviewResponse>>,
}

impl OverviewWatcher {
    pub fn spawn(api: Arc<dyn RegistrationApi>, poll_interval: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                ticker.tick().await;
                match api.fetch_overview().await {
                    Ok(snapshot) => {
                        if sender.send(Some(snapshot)).is_err() {
                            // Every receiver is gone
                            break;
                        }
                    }
                    // A failed refresh keeps the previous snapshot on screen
                    Err(e) => warn!("Overview refresh failed: {}", e),
                }
            }
        });

        Self { task, receiver }
    }

    /// Receiver yielding the latest snapshot (None until the first fetch)
    pub fn subscribe(&self) -> watch::Receiver<Option<OverviewResponse>> {
        self.receiver.clone()
    }

    /// Stop polling. Must be called on view teardown.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for OverviewWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use async_trait::async_trait;
    use shared::{CreateRegistrationRequest, RegisterResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns a snapshot whose count equals the number of fetches so far
    struct CountingApi {
        fetches: AtomicUsize,
    }

    impl CountingApi {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RegistrationApi for CountingApi {
        async fn register(
            &self,
            _request: CreateRegistrationRequest,
        ) -> Result<RegisterResponse, ApiError> {
            Err(ApiError::Network("not used in these tests".to_string()))
        }

        async fn fetch_overview(&self) -> Result<OverviewResponse, ApiError> {
            let fetches = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OverviewResponse {
                success: true,
                count: fetches,
                total_adults: fetches as u32 * 2,
                total_kids: 0,
                registrations: Vec::new(),
            })
        }
    }

    async fn let_background_tasks_run() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_is_immediate_then_per_interval() {
        let api = Arc::new(CountingApi::new());
        let watcher = OverviewWatcher::spawn(api.clone(), DEFAULT_POLL_INTERVAL);
        let receiver = watcher.subscribe();

        let_background_tasks_run().await;
        assert_eq!(receiver.borrow().as_ref().unwrap().count, 1);

        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        let_background_tasks_run().await;
        assert_eq!(receiver.borrow().as_ref().unwrap().count, 2);
        assert_eq!(receiver.borrow().as_ref().unwrap().total_guests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_the_polling_task() {
        let api = Arc::new(CountingApi::new());
        let watcher = OverviewWatcher::spawn(api.clone(), DEFAULT_POLL_INTERVAL);

        let_background_tasks_run().await;
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);

        watcher.cancel();
        let_background_tasks_run().await;

        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        tokio::time::advance(DEFAULT_POLL_INTERVAL).await;
        let_background_tasks_run().await;

        // No fetches after cancellation
        assert_eq!(api.fetches.load(Ordering::SeqCst), 1);
    }
}
