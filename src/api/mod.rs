//! HTTP API
//!
//! JSON endpoints for the Mini App, the admin withdrawal queue and the
//! settlement trigger.

pub mod errors;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::{create_app, ApiServer};
