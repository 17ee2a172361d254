//! Gateway: HTTP server, engagement pipeline and callback dispatch.
//!
//! Lifecycle:
//! 1. Load config, open the session store (loading persisted sessions)
//! 2. Build the provider chain and callback dispatcher
//! 3. Serve `/`, `/analyze`, `/session/{id}` and `/health`
//! 4. On shutdown, wait for in-flight callback dispatches

pub mod auth;
pub mod callback;
pub mod engage;
pub mod server;
pub mod state;

pub use {
    callback::{CallbackDispatcher, CallbackError, should_dispatch},
    engage::{end_session, process},
    server::{build_gateway_app, start_gateway},
    state::{GatewayState, open_store},
};
