// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user read receipts for announcements and events.

use std::sync::Arc;

use plexus_core::types::{ReadReceipt, SubjectType, now_timestamp};
use plexus_core::{PlexusError, StorageAdapter};
use serde::Serialize;
use tracing::debug;

/// Unread broadcast counts for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnreadCounts {
    pub announcements: i64,
    pub events: i64,
    pub total: i64,
}

/// Records and counts which broadcasts a user has seen.
pub struct ReadTracker {
    storage: Arc<dyn StorageAdapter>,
}

impl ReadTracker {
    pub fn new(storage: Arc<dyn StorageAdapter>) -> Self {
        Self { storage }
    }

    /// Record that `user_id` read the subject. Repeat marks are no-ops.
    pub async fn mark_read(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
        user_id: &str,
    ) -> Result<(), PlexusError> {
        let entity = match subject_type {
            SubjectType::Announcement => "announcement",
            SubjectType::Event => "event",
        };
        let subject = self
            .storage
            .get_content(subject_id)
            .await?
            .filter(|item| item.kind == subject_type.content_kind())
            .filter(|item| item.published || item.owner_id == user_id)
            .ok_or_else(|| PlexusError::not_found(entity, subject_id))?;

        let receipt = ReadReceipt {
            subject_id: subject.id,
            subject_type,
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };
        match self.storage.insert_read_receipt(&receipt).await {
            Ok(()) => Ok(()),
            Err(PlexusError::AlreadyExists { .. }) => {
                debug!(subject_id, user_id, "already read");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn is_read(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
        user_id: &str,
    ) -> Result<bool, PlexusError> {
        self.storage
            .read_receipt_exists(subject_id, subject_type, user_id)
            .await
    }

    /// Published broadcasts created since the user registered and not yet read.
    pub async fn unread_count(&self, user_id: &str) -> Result<UnreadCounts, PlexusError> {
        let user = self
            .storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| PlexusError::not_found("user", user_id))?;

        let mut counts = UnreadCounts {
            announcements: 0,
            events: 0,
            total: 0,
        };
        for subject_type in SubjectType::ALL {
            let n = self
                .storage
                .count_unread_broadcasts(user_id, subject_type.content_kind(), &user.created_at)
                .await?;
            match subject_type {
                SubjectType::Announcement => counts.announcements = n,
                SubjectType::Event => counts.events = n,
            }
            counts.total += n;
        }
        Ok(counts)
    }
}
