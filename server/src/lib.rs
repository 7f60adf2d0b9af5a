pub mod admin;
pub mod listener;
pub mod persist;
pub mod player;
pub mod server;
pub mod session;

mod rate;

pub use server::{Server, ServerConfig, ServerError};
