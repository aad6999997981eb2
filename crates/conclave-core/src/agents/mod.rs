//! The agent panel: agent specs, panel files and the registry that binds them
//! to provider adapters

pub mod profile;
pub mod registry;

pub use profile::{AgentSpec, PanelDefinition, PanelEntry};
pub use registry::AgentRegistry;
