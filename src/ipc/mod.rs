//! IPC module for tracker, injector and UI communication

mod protocol;
mod server;

pub use server::Server;
