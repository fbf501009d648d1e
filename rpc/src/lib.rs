//! HTTP API for the FaceGate liveness protocol.
//!
//! Two endpoints form the platform's bit-exact boundary:
//! - `GET /live/challenge` — issue a challenge for the calling tenant.
//! - `POST /live/verify` — submit a challenge token and two frames.
//!
//! Plus `GET /` as a health probe. Every request authenticates with the
//! service credential in `X-Api-Key` and identifies its tenant through the
//! `X-Org-Id` / `X-Branch-Code` / `X-Device-Code` headers.

pub mod config;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::ServiceConfig;
pub use error::RpcError;
pub use server::{router, AppState, RpcServer};
