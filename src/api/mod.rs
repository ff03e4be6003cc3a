/*
 * Responsibility
 * - HTTP surface (routes() の re-export など)
 */
pub mod extractors;
pub mod handlers;
mod routes;

pub use routes::routes;
