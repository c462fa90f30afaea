//! StagePass Server - Event management backend.
//!
//! This crate provides a CRUD backend for events, the artists booked for
//! them, and the resources rented for them, responsible for:
//! - Persisting the three record kinds in SQLite
//! - Validating request bodies at the HTTP boundary
//! - Issuing signed tokens for a fixed credential list and guarding every
//!   non-auth route behind them
//!
//! # Architecture
//!
//! Requests flow from the axum router through the bearer-token middleware to
//! thin handlers, which call per-table repositories. The persisted row is
//! serialized back as the response, together with eager-loaded relations
//! where the route specifies them (events embed their artists and resources;
//! artists and resources embed their parent event).

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod users;
