//! Bearer-token authorization gate for realm-issued JWTs.
//!
//! `services::auth` holds the transport-agnostic pipeline
//! (header -> verified claims -> roles -> access decision);
//! `api` and `middleware` wire it into an axum router.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
