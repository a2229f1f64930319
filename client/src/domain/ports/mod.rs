//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_provider;
mod notifier;
mod read_model;
mod rpc_gateway;

#[cfg(test)]
pub use auth_provider::MockAuthProvider;
pub use auth_provider::{AuthEvent, AuthProvider, AuthProviderError, FixtureAuthProvider};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, SilentNotifier};
#[cfg(test)]
pub use read_model::{MockFamilyView, MockRefetch};
pub use read_model::{FamilyView, Refetch};
#[cfg(test)]
pub use rpc_gateway::MockRpcGateway;
pub use rpc_gateway::{FixtureRpcGateway, Procedure, RpcError, RpcGateway};
