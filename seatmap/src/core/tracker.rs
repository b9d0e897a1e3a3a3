//! Location Tracker - 持续定位
//!
//! Wraps a platform [`LocationSource`] into a single current-location value.
//! Each fix is published once on a `watch` channel (only the latest fix
//! matters, nothing is queued); failures go out on a `broadcast` channel and
//! leave the current location untouched.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::BoxStream;
use shared::geo::Coordinate;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::AppError;

/// Location failure reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// Options handed to the location source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back
    pub maximum_age: Duration,
    /// How long to wait for a fix before reporting [`LocationError::Timeout`]
    pub timeout: Duration,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
        }
    }
}

pub type FixStream = BoxStream<'static, Result<Coordinate, LocationError>>;

/// Platform geolocation service
pub trait LocationSource: Send + Sync {
    /// Start continuous position updates; dropping the stream stops them
    fn watch_position(&self, options: &TrackerOptions) -> FixStream;
}

/// 定位订阅
struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Continuous location tracker
pub struct LocationTracker {
    source: Arc<dyn LocationSource>,
    options: TrackerOptions,
    latest: Arc<watch::Sender<Option<Coordinate>>>,
    errors: broadcast::Sender<LocationError>,
    subscription: Option<Subscription>,
}

impl LocationTracker {
    pub fn new(source: Arc<dyn LocationSource>, options: TrackerOptions) -> Self {
        let (latest, _) = watch::channel(None);
        let (errors, _) = broadcast::channel(16);
        Self {
            source,
            options,
            latest: Arc::new(latest),
            errors,
            subscription: None,
        }
    }

    /// Receiver of the current location; changes once per fix
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinate>> {
        self.latest.subscribe()
    }

    /// Receiver of location failures
    pub fn subscribe_errors(&self) -> broadcast::Receiver<LocationError> {
        self.errors.subscribe()
    }

    /// Last known location, `None` until the first fix
    pub fn current(&self) -> Option<Coordinate> {
        *self.latest.borrow()
    }

    pub fn options(&self) -> &TrackerOptions {
        &self.options
    }

    /// Whether a subscription is running
    pub fn is_active(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }

    /// Start receiving updates; a no-op while already active
    pub fn activate(&mut self) {
        if self.is_active() {
            return;
        }
        // A finished subscription (source ended) is replaced
        self.deactivate();

        let cancel = CancellationToken::new();
        let mut stream = self.source.watch_position(&self.options);
        let timeout = self.options.timeout;
        let latest = self.latest.clone();
        let errors = self.errors.clone();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = tokio::time::timeout(timeout, stream.next()) => {
                        if token.is_cancelled() {
                            break;
                        }
                        match next {
                            Ok(Some(Ok(fix))) => {
                                tracing::trace!(lat = fix.lat, lng = fix.lng, "Location fix");
                                latest.send_replace(Some(fix));
                            }
                            Ok(Some(Err(e))) => {
                                tracing::warn!(error = %e, "Location update failed");
                                let _ = errors.send(e);
                            }
                            Ok(None) => {
                                tracing::debug!("Location source ended");
                                break;
                            }
                            Err(_) => {
                                tracing::warn!(timeout_secs = timeout.as_secs(), "Location fix timed out");
                                let _ = errors.send(LocationError::Timeout);
                            }
                        }
                    }
                }
            }
        });

        tracing::info!(
            high_accuracy = self.options.high_accuracy,
            "Location tracking activated"
        );
        self.subscription = Some(Subscription { cancel, task });
    }

    /// Resolves once the subscription task has ended (source exhausted or
    /// deactivated); immediately when there is no running subscription
    pub async fn stopped(&mut self) {
        if let Some(subscription) = self.subscription.as_mut() {
            // A completed JoinHandle must not be polled again
            if subscription.task.is_finished() {
                return;
            }
            let _ = (&mut subscription.task).await;
        }
    }

    /// Stop receiving updates; calling it again is a no-op
    pub fn deactivate(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel.cancel();
            tracing::info!("Location tracking deactivated");
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel.cancel();
        }
    }
}

/// Replays a fixed list of fixes, one per interval
///
/// Stands in for the platform service in the CLI (`track --fixes`) and in
/// tests.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    fixes: Vec<Result<Coordinate, LocationError>>,
    interval: Duration,
}

impl ReplaySource {
    pub fn new(fixes: Vec<Result<Coordinate, LocationError>>, interval: Duration) -> Self {
        Self { fixes, interval }
    }

    /// Load a JSON list of `{"lat": .., "lng": ..}` fixes
    pub fn from_json_file(path: &Path, interval: Duration) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path)?;
        let fixes: Vec<Coordinate> = serde_json::from_str(&content)?;
        Ok(Self::new(fixes.into_iter().map(Ok).collect(), interval))
    }
}

impl LocationSource for ReplaySource {
    fn watch_position(&self, _options: &TrackerOptions) -> FixStream {
        let interval = self.interval;
        futures::stream::iter(self.fixes.clone())
            .then(move |fix| async move {
                tokio::time::sleep(interval).await;
                fix
            })
            .boxed()
    }
}
