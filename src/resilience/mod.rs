//! 网络弹性层
//!
//! - `retry`: 有界重试与指数退避
//! - `classify`: 远程错误分类与用户提示
//! - `network`: 连通性检测与等待

pub mod classify;
pub mod network;
pub mod retry;

pub use classify::{Cancelled, ErrorCause, RemoteError, classify_remote_error};
pub use network::{ConnectivitySignal, NetworkMonitor, Unmonitored, await_network, is_online};
pub use retry::{RetryPolicy, with_retry};
