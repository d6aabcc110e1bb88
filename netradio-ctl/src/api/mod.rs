//! HTTP control API
//!
//! Endpoint paths and response shapes are fixed by the browser control
//! panel, so they keep its camelCase naming.

pub mod handlers;
pub mod server;

pub use server::{create_router, run, AppContext};
