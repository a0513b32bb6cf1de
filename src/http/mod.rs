//! HTTP status API.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (x-request-id set + propagated)
//!     → handlers.rs (run the backend probes)
//!     → status.rs (shape JSON, staleness)
//!     → no-cache headers on every response
//! ```

pub mod handlers;
pub mod request;
pub mod server;
pub mod status;

pub use request::X_REQUEST_ID;
pub use server::{ApiServer, AppState};
