// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket gateway for the Plexus engine.
//!
//! - [`registry::SessionRegistry`]: live sessions keyed by user id; the
//!   engine's real-time delivery channel.
//! - [`ws`]: `GET /ws?user_id=...` joins a socket to the registry.
//! - [`handlers`]: thin JSON endpoints over the engine operations.

pub mod handlers;
pub mod registry;
pub mod server;
pub mod ws;

pub use registry::SessionRegistry;
pub use server::{GatewayState, router, start_server};
