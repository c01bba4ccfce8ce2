//! Places Web Server
//!
//! Serves the map page and a same-origin API in front of the municipal
//! GIS service, so the browser never calls the upstream directly.

pub mod router;
pub mod routes;
pub mod state;

pub use router::build_router;
pub use state::AppState;
