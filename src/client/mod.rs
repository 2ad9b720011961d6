//! Client side: connection setup, retry policy and the send pipeline

pub mod app;
pub mod connector;
pub mod retry;
pub mod sender;
pub mod system_info;

pub use app::ClientApp;
pub use connector::{Connector, TcpConnector};
pub use retry::{RetryAttempt, RetryPolicy};
pub use sender::Sender;
pub use system_info::SystemInfo;
