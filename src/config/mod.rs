mod server;

pub use server::{ConfigFile, DEFAULT_SEARCH_RESULT_LIMIT, ServerConfig};
