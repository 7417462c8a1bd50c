//! Storage seam between the HTTP layer and PostgreSQL.
//!
//! Reads go through [`RetryPolicy`]: exponential backoff with random jitter
//! between attempts. Writes are attempted once.
use crate::db;
use crate::domain::models::{NewSubmission, Submission};
use crate::domain::records::{
    Enrollment, NewEnrollment, NewStaffRatio, RatioAssessment, RoomPlan, StaffRatio,
};
use async_trait::async_trait;
use rand::Rng;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{operation} failed after {attempts} attempt(s): {message}")]
    Unavailable {
        operation: &'static str,
        attempts: u32,
        message: String,
    },
    #[error("{operation} failed: {message}")]
    Write {
        operation: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// All submissions, newest first.
    async fn fetch_submissions(&self) -> Result<Vec<Submission>, StoreError>;
    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Uuid, StoreError>;

    async fn fetch_staff_ratios(&self) -> Result<Vec<StaffRatio>, StoreError>;
    async fn insert_staff_ratio(
        &self,
        ratio: &NewStaffRatio,
        assessment: &RatioAssessment,
    ) -> Result<StaffRatio, StoreError>;

    async fn fetch_enrollment(&self) -> Result<Vec<Enrollment>, StoreError>;
    async fn insert_enrollment(
        &self,
        entry: &NewEnrollment,
        occupancy_rate: f64,
    ) -> Result<Enrollment, StoreError>;

    async fn fetch_room_plans(&self) -> Result<Vec<RoomPlan>, StoreError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based). The ceiling is
    /// `base * 2^(attempt-1)` capped at `max_delay`; the delay is a random
    /// point in the upper half of it, so it never exceeds `max_delay`.
    fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
            .min(self.max_delay);
        let half = ceiling / 2;
        let spread_ms = (ceiling - half).as_millis() as u64;
        let jitter = if spread_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=spread_ms)
        };
        (half + Duration::from_millis(jitter)).min(ceiling)
    }

    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {:#}",
                        operation,
                        attempt,
                        attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!("{} failed after {} attempt(s): {:#}", operation, attempt, e);
                    return Err(StoreError::Unavailable {
                        operation,
                        attempts: attempt,
                        message: format!("{:#}", e),
                    });
                }
            }
        }
    }
}

fn write_error(operation: &'static str, e: anyhow::Error) -> StoreError {
    tracing::error!("{} failed: {:#}", operation, e);
    StoreError::Write {
        operation,
        message: format!("{:#}", e),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn fetch_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        self.retry
            .run("fetch submissions", || db::fetch_submissions(&self.pool))
            .await
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Uuid, StoreError> {
        db::insert_submission(&self.pool, submission)
            .await
            .map_err(|e| write_error("insert submission", e))
    }

    async fn fetch_staff_ratios(&self) -> Result<Vec<StaffRatio>, StoreError> {
        self.retry
            .run("fetch staff ratios", || db::fetch_staff_ratios(&self.pool))
            .await
    }

    async fn insert_staff_ratio(
        &self,
        ratio: &NewStaffRatio,
        assessment: &RatioAssessment,
    ) -> Result<StaffRatio, StoreError> {
        db::insert_staff_ratio(&self.pool, ratio, assessment)
            .await
            .map_err(|e| write_error("insert staff ratio", e))
    }

    async fn fetch_enrollment(&self) -> Result<Vec<Enrollment>, StoreError> {
        self.retry
            .run("fetch enrollment", || db::fetch_enrollment(&self.pool))
            .await
    }

    async fn insert_enrollment(
        &self,
        entry: &NewEnrollment,
        occupancy_rate: f64,
    ) -> Result<Enrollment, StoreError> {
        db::insert_enrollment(&self.pool, entry, occupancy_rate)
            .await
            .map_err(|e| write_error("insert enrollment", e))
    }

    async fn fetch_room_plans(&self) -> Result<Vec<RoomPlan>, StoreError> {
        self.retry
            .run("fetch room plans", || db::fetch_room_plans(&self.pool))
            .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failure() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy(3)
            .run("flaky", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(anyhow::anyhow!("connection reset"))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = fast_policy(2)
            .run("down", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(anyhow::anyhow!("connection refused"))
            })
            .await;
        match result {
            Err(StoreError::Unavailable { attempts, message, .. }) => {
                assert_eq!(attempts, 2);
                assert!(message.contains("connection refused"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _ = fast_policy(0)
            .run("once", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_is_bounded() {
        let policy = RetryPolicy {
            attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(400),
        };
        for _ in 0..50 {
            let first = policy.delay(1);
            assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));
            let second = policy.delay(2);
            assert!(second >= Duration::from_millis(100) && second <= Duration::from_millis(200));
            let late = policy.delay(10);
            assert!(late >= Duration::from_millis(200) && late <= policy.max_delay);
        }
    }
}
