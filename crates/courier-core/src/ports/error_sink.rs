//! ErrorSink port - 配送失敗の報告先
//!
//! Workers never return delivery failures to whoever launched them (launch has
//! long returned). Failures go to the runtime through this port instead.

use crate::domain::DeliveryReport;

pub trait ErrorSink: Send + Sync {
    fn report(&self, report: DeliveryReport);
}
