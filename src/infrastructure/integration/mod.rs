//! Git integration adapters

mod relay;

pub use relay::{RelayApi, RelayError, RelayIntegration, RelayRepository, RELAY_API_VERSION};
