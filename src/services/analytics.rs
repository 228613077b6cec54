use crate::{error::RejectionReason, models::CheckInStats, services::CacheService};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct Analytics {
    cache: Arc<CacheService>,
    check_ins_total: AtomicU64,
    rejections_total: AtomicU64,
    start_time: Instant,
}

impl Analytics {
    pub fn new(cache: Arc<CacheService>) -> Self {
        Self {
            cache,
            check_ins_total: AtomicU64::new(0),
            rejections_total: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub async fn record_check_in(&self, event_id: &str) {
        self.check_ins_total.fetch_add(1, Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let _ = self
            .cache
            .increment(&format!("analytics:checkins:{}", date), 1)
            .await;
        let _ = self
            .cache
            .increment(&format!("analytics:event:{}:{}", event_id, date), 1)
            .await;
    }

    pub async fn record_rejection(&self, reason: RejectionReason) {
        self.rejections_total.fetch_add(1, Ordering::SeqCst);

        let date = Utc::now().format("%Y-%m-%d").to_string();
        let _ = self
            .cache
            .increment(&format!("analytics:rejections:{}:{}", reason.code(), date), 1)
            .await;
    }

    pub async fn get_stats(&self) -> CheckInStats {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let check_ins_today = self
            .cache
            .increment(&format!("analytics:checkins:{}", date), 0)
            .await
            .unwrap_or(0) as u64;

        CheckInStats {
            total_check_ins: self.check_ins_total.load(Ordering::SeqCst),
            check_ins_today,
            rejections_total: self.rejections_total.load(Ordering::SeqCst),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
