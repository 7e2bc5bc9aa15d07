//! Database metrics collection.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
pub fn record_query_duration(query_name: &str, outcome: &'static str, duration_secs: f64) {
    histogram!(
        "database_query_duration_seconds",
        "query" => query_name.to_string(),
        "outcome" => outcome
    )
    .record(duration_secs);
}

/// Record database connection pool metrics.
///
/// Called by the readiness probe.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_registration_in_event");
/// let result = sqlx::query_as::<_, RegistrationEntity>(...).fetch_optional(&pool).await;
/// timer.record_result(&result);
/// result
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration as a successful query.
    pub fn record(self) {
        self.finish("ok");
    }

    /// Record the elapsed duration, labelled by whether the query failed.
    pub fn record_result<T, E>(self, result: &Result<T, E>) {
        self.finish(if result.is_ok() { "ok" } else { "error" });
    }

    fn finish(self, outcome: &'static str) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(self.query_name, outcome, duration);
    }
}
