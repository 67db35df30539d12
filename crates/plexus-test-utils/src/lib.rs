// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plexus integration tests.
//!
//! - [`RecordingPublisher`]: captures real-time pushes and can be told to
//!   fail for specific users.
//! - [`TestHarness`]: temp SQLite store, fully wired engine, seeded users.

pub mod harness;
pub mod recording_publisher;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use recording_publisher::{PushRecord, RecordingPublisher};
