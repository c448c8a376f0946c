//! Client-side synchronization over the SSE change feed.
//!
//! Frontends fetch a full snapshot on connect and then fold incremental
//! events into it. [`projection::ClientProjection`] is that fold, shared here
//! so host and player frontends (and the tests) agree on the semantics:
//! events are applied idempotently, and round-scoped state is torn down
//! whenever the active round reference changes.

pub mod projection;

pub use projection::ClientProjection;
