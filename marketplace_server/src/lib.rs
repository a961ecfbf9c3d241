//! # Marketplace server
//! This crate hosts the REST server for the marketplace. It is responsible for:
//! * Authenticating requests with bearer tokens, and issuing and revoking those tokens.
//! * Parsing and validating request bodies and query strings.
//! * Handing requests off to the engine APIs and rendering the results (or errors) as JSON.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/v1/...`: The marketplace API. See [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;
