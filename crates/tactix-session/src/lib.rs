//! Connection identity management for Tactix.
//!
//! This crate handles who is connected:
//!
//! 1. **Authentication** — mapping a credential to a durable
//!    [`Identity`] ([`Authenticator`] trait; verification itself is an
//!    external collaborator)
//! 2. **Connection handles** — the typed outbound channel, liveness
//!    flag, and idempotent-cleanup latch for each socket
//!    ([`ConnectionHandle`])
//! 3. **The registry** — one live connection per user, with
//!    replace-on-reconnect supersession ([`ConnectionRegistry`])

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod handle;
mod registry;

pub use auth::{Authenticator, Identity};
pub use error::SessionError;
pub use handle::{ConnectionHandle, Outbound};
pub use registry::ConnectionRegistry;
