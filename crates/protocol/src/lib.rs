//! Wire schema shared by the HTTP gateway and the callback dispatcher.
//!
//! Inbound bodies arrive in several loose shapes; [`normalize`] is the only
//! place that looks at raw JSON.

pub mod adapter;
pub mod types;

pub use {
    adapter::normalize,
    types::{
        AnalyzeResponse, CallbackPayload, EngagementMetrics, HealthResponse, InboundRequest,
        Metadata, SessionView, FALLBACK_OPENER,
    },
};
