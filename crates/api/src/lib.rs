//! HTTP API layer for sofie-monitor.
//!
//! - **Endpoints**: service message authoring and the Sofie instance registry
//! - **Health**: liveness probe reporting pending distribution jobs
//!
//! Built on Axum 0.8. Tracing and CORS layers are added by the server.

pub mod endpoints;
pub mod response;
pub mod state;

pub use endpoints::{health_router, router};
pub use response::ApiResponse;
pub use state::AppState;
