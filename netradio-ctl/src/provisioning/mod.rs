//! WiFi provisioning

pub mod controller;
pub mod joiner;

pub use controller::{ProvisioningController, ProvisioningStatus};
pub use joiner::{CommandJoiner, ProvisioningRequest, UnconfiguredJoiner, WifiJoiner};
