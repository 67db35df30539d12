// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph-constrained mention resolution.
//!
//! Candidates come from caller-supplied ids and inline `@word` tokens. Only
//! candidates holding an ACCEPTED connection with the author survive; each
//! survivor gets a mention row and a MENTION notification. A failure for one
//! candidate is logged and the rest continue.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use plexus_core::types::{Mention, NotificationDraft, NotificationType, RelatedType};
use plexus_core::{BestEffort, PlexusError, StorageAdapter};
use plexus_notify::NotificationDispatcher;
use regex::Regex;
use tracing::{debug, warn};

use crate::connections::ConnectionService;

static MENTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\w+)").expect("mention token pattern is valid"));

/// The text being scanned and where it lives.
#[derive(Debug, Clone, Copy)]
pub struct MentionSource<'a> {
    /// Post or comment id the mentions attach to.
    pub content_id: &'a str,
    pub related_type: RelatedType,
    pub text: &'a str,
    pub explicit_ids: &'a [String],
    pub author_id: &'a str,
}

/// Inline `@word` tokens in order of appearance, without duplicates.
pub fn mention_tokens(text: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    MENTION_TOKEN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .filter(|token| seen.insert(token.to_lowercase()))
        .collect()
}

pub struct MentionResolver {
    storage: Arc<dyn StorageAdapter>,
    connections: Arc<ConnectionService>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl MentionResolver {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        connections: Arc<ConnectionService>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            storage,
            connections,
            dispatcher,
        }
    }

    /// Resolve, record, and notify mentions. Returns the mentioned user ids.
    pub async fn resolve(&self, source: MentionSource<'_>) -> Result<Vec<String>, PlexusError> {
        let candidates = self.candidates(&source).await;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let author_name = self.dispatcher.actor_name(source.author_id).await;
        let draft = NotificationDraft::new(
            NotificationType::Mention,
            format!("{author_name} mentioned you"),
        )
        .triggered_by(source.author_id)
        .related(source.content_id, source.related_type);

        let mut mentioned = Vec::new();
        for candidate in candidates {
            match self.connections.are_connected(source.author_id, &candidate).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(user_id = %candidate, "mention dropped: not connected to author");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, user_id = %candidate, "mention candidate check failed");
                    continue;
                }
            }

            let mention = Mention {
                content_id: source.content_id.to_string(),
                user_id: candidate.clone(),
            };
            match self.storage.insert_mention(&mention).await {
                Ok(()) => {}
                Err(PlexusError::AlreadyExists { .. }) => continue,
                Err(e) => {
                    warn!(error = %e, user_id = %candidate, "failed to record mention");
                    continue;
                }
            }

            self.dispatcher
                .notify(&candidate, &draft)
                .await
                .best_effort("notify mention");
            mentioned.push(candidate);
        }
        Ok(mentioned)
    }

    /// Replace every mention of the content with a fresh resolution.
    ///
    /// Callers invoke this only when the text actually changed.
    pub async fn regenerate(&self, source: MentionSource<'_>) -> Result<Vec<String>, PlexusError> {
        let removed = self.storage.delete_mentions(source.content_id).await?;
        debug!(content_id = source.content_id, removed, "mentions cleared for regeneration");
        self.resolve(source).await
    }

    /// Explicit ids then token matches, deduplicated, author removed.
    async fn candidates(&self, source: &MentionSource<'_>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        let mut offer = |id: String| {
            if id != source.author_id && seen.insert(id.clone()) {
                ordered.push(id);
            }
        };

        for id in source.explicit_ids {
            offer(id.clone());
        }
        for token in mention_tokens(source.text) {
            let matches = self
                .storage
                .find_verified_users_matching(token)
                .await
                .best_effort("match mention token")
                .unwrap_or_default();
            for user in matches {
                offer(user.id);
            }
        }
        ordered
    }
}
