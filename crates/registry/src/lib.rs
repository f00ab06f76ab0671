//! RWA Guard Land Registry
//!
//! Off-chain ownership evidence: asks the jurisdiction's registry who owns
//! the asset and compares the answer with the SPV legal entity.
//!
//! Implementations of [`OwnershipRegistry`]:
//! - [`HttpRegistryClient`]: jurisdiction-specific REST endpoints with bearer auth
//! - [`MockRegistry`]: fixed records for tests

mod check;
mod client;
mod error;
mod mock;
mod types;

pub use check::{evaluate_record, LandRegistryCheck};
pub use client::{HttpRegistryClient, OwnershipRegistry, RegistryEndpoint};
pub use error::RegistryError;
pub use mock::MockRegistry;
pub use types::RegistryRecord;
