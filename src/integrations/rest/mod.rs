pub mod client;

pub use client::RestGateway;
