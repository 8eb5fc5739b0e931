use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use shared::Coordinate;

/// Hard bound on the one-shot fix; there is no cached fallback.
pub const POSITION_FIX_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum PositionError {
    #[error("no location capability available")]
    Unavailable,
    #[error("location permission denied")]
    Denied,
    #[error("timed out waiting for a position fix")]
    Timeout,
}

/// Platform positioning seam.
///
/// `watch` hands back the receiving half of a sample stream; dropping the
/// receiver is the unsubscribe. The session layer creates a fresh receiver
/// per tracking session and drops it on session end, so a stale handle can
/// never outlive its session.
pub trait PositionSource {
    /// One-shot fresh fix, never a cached reading. Callers bound it with
    /// [`initial_fix`].
    fn current_position(&self) -> impl Future<Output = Result<Coordinate, PositionError>> + Send;

    fn watch(&self) -> mpsc::Receiver<Coordinate>;
}

/// One-shot fix bounded by [`POSITION_FIX_TIMEOUT`].
pub async fn initial_fix<P: PositionSource>(source: &P) -> Result<Coordinate, PositionError> {
    tokio::time::timeout(POSITION_FIX_TIMEOUT, source.current_position())
        .await
        .map_err(|_| PositionError::Timeout)?
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(Coordinate);

    impl PositionSource for FixedSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            Ok(self.0)
        }

        fn watch(&self) -> mpsc::Receiver<Coordinate> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    struct DeniedSource;

    impl PositionSource for DeniedSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            Err(PositionError::Denied)
        }

        fn watch(&self) -> mpsc::Receiver<Coordinate> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    struct SilentSource;

    impl PositionSource for SilentSource {
        async fn current_position(&self) -> Result<Coordinate, PositionError> {
            std::future::pending().await
        }

        fn watch(&self) -> mpsc::Receiver<Coordinate> {
            let (_tx, rx) = mpsc::channel(1);
            rx
        }
    }

    #[tokio::test]
    async fn test_initial_fix_returns_fresh_reading() {
        let source = FixedSource(Coordinate { lat: 40.0, lon: -74.0 });
        let fix = initial_fix(&source).await.unwrap();
        assert_eq!(fix, Coordinate { lat: 40.0, lon: -74.0 });
    }

    #[tokio::test]
    async fn test_initial_fix_propagates_denial() {
        assert!(matches!(
            initial_fix(&DeniedSource).await,
            Err(PositionError::Denied)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_fix_times_out_after_five_seconds() {
        let started = tokio::time::Instant::now();
        let result = initial_fix(&SilentSource).await;

        assert!(matches!(result, Err(PositionError::Timeout)));
        assert_eq!(started.elapsed(), POSITION_FIX_TIMEOUT);
    }
}
