mod activity;
mod capability;
mod models;

pub use activity::*;
pub use capability::{Capability, CapabilitySet};
pub use models::*;
