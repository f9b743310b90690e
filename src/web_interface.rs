// Web Interface module root
pub mod routes;
pub mod types;
pub mod web_server;

// Re-export commonly used items
pub use routes::{handle_rejection, status_for, store_event_stream, SharedGate};
pub use web_server::WebServer;
