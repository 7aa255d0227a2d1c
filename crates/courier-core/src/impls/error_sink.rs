//! ErrorSink 実装
//!
//! - **TracingErrorSink**: `warn!` に出すだけ（デフォルト）
//! - **CollectingErrorSink**: レポートを溜める（テスト・CLI の集計用）

use parking_lot::Mutex;
use tracing::warn;

use crate::domain::DeliveryReport;
use crate::ports::ErrorSink;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorSink;

impl TracingErrorSink {
    fn log(&self, report: &DeliveryReport) {
        warn!(
            message_id = %report.message_id,
            origin = %report.origin,
            dest = %report.dest_actor,
            error = %report.error,
            "message could not be delivered"
        );
    }
}

impl ErrorSink for TracingErrorSink {
    fn report(&self, report: DeliveryReport) {
        self.log(&report);
    }
}

/// Keeps every report; also logs them like `TracingErrorSink`.
#[derive(Default)]
pub struct CollectingErrorSink {
    reports: Mutex<Vec<DeliveryReport>>,
}

impl CollectingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Take all reports collected so far.
    pub fn drain(&self) -> Vec<DeliveryReport> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl ErrorSink for CollectingErrorSink {
    fn report(&self, report: DeliveryReport) {
        TracingErrorSink.log(&report);
        self.reports.lock().push(report);
    }
}
