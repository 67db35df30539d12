// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for CRUD operations on storage entities.

pub mod connections;
pub mod content;
pub mod engagement;
pub mod notifications;
pub mod receipts;
pub mod users;
