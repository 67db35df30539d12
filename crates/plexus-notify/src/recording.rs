// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; nothing is collected unless the host process
//! installs a recorder.

use metrics::describe_counter;
use plexus_core::types::NotificationType;

/// Register notification metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        "plexus_notifications_created_total",
        "Notification rows persisted"
    );
    describe_counter!(
        "plexus_notifications_deduped_total",
        "Notifications skipped because an identical LIKE already existed"
    );
    describe_counter!(
        "plexus_notifications_pushed_total",
        "Real-time pushes handed to the delivery channel"
    );
    describe_counter!(
        "plexus_notification_push_failures_total",
        "Real-time pushes that failed and were discarded"
    );
}

pub fn record_created(kind: NotificationType, count: usize) {
    metrics::counter!("plexus_notifications_created_total", "type" => kind.to_string())
        .increment(count as u64);
}

pub fn record_deduped(kind: NotificationType) {
    metrics::counter!("plexus_notifications_deduped_total", "type" => kind.to_string())
        .increment(1);
}

pub fn record_pushed() {
    metrics::counter!("plexus_notifications_pushed_total").increment(1);
}

pub fn record_push_failure() {
    metrics::counter!("plexus_notification_push_failures_total").increment(1);
}
