// src/repositories/mod.rs
//
// Gateway layer
//
// CRITICAL RULES:
// - Gateways are DUMB transports
// - NO filtering, sorting or pagination logic
// - NO toast or event emission

pub mod memory_gateway;
pub mod resource_gateway;

pub use memory_gateway::{EnvelopeStyle, InMemoryGateway};
pub use resource_gateway::{ListParams, ResourceGateway};

#[cfg(test)]
pub use resource_gateway::MockResourceGateway;
