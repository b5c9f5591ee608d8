//! Live push-channel connections.

pub mod authenticator;
pub mod handle;
pub mod registry;

pub use authenticator::ConnectionAuthenticator;
pub use handle::ConnectionHandle;
pub use registry::ConnectionRegistry;
