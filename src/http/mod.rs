//! HTTP surface of the host: health check and the peer upgrade

pub mod routes;

pub use routes::build_router;
