pub(self) mod api_key;
pub mod config;
pub(self) mod errors;
mod http_layers;
pub mod server;
pub mod state;
pub(self) mod stream_song;

pub use api_key::HEADER_API_KEY;
pub use config::ServerConfig;
pub use errors::ErrorResponse;
pub use http_layers::*;
pub use server::{make_app, run_server};
