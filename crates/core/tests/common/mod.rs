//! Common test utilities shared by the integration suites.
//!
//! - Fixtures (runs, stores, engines wired to a channel)
//! - Mock clients beyond the built-in `MockStageClient`
//! - Event assertions

pub mod assertions;
pub mod fixtures;
pub mod mock_clients;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_clients::*;
