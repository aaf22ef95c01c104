//! 网络连通性检测

use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::retry::cancelled;

/// 宿主平台提供的连通性信号
pub trait ConnectivitySignal: Send + Sync {
    /// 当前是否在线；宿主无法提供信号时返回 `None`
    fn current(&self) -> Option<bool>;

    /// 订阅连通性变化；不支持订阅时返回 `None`
    ///
    /// 接收端被 drop 即视为取消订阅。
    fn subscribe(&self) -> Option<watch::Receiver<bool>>;
}

/// 由宿主主动更新的连通性状态
#[derive(Debug)]
pub struct NetworkMonitor {
    sender: watch::Sender<bool>,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    /// 更新在线状态，变化会通知所有订阅者
    pub fn set_online(&self, online: bool) {
        let previous = self.sender.send_replace(online);
        if previous != online {
            debug!("Connectivity changed: online = {}", online);
        }
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivitySignal for NetworkMonitor {
    fn current(&self) -> Option<bool> {
        Some(*self.sender.borrow())
    }

    fn subscribe(&self) -> Option<watch::Receiver<bool>> {
        Some(self.sender.subscribe())
    }
}

/// 没有连通性信号的环境（例如服务端进程）
#[derive(Debug, Clone, Copy, Default)]
pub struct Unmonitored;

impl ConnectivitySignal for Unmonitored {
    fn current(&self) -> Option<bool> {
        None
    }

    fn subscribe(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// 当前是否在线，信号不可用时视为在线
pub fn is_online(signal: &dyn ConnectivitySignal) -> bool {
    signal.current().unwrap_or(true)
}

/// 等待网络恢复
///
/// 已在线时立即返回 `true`；否则在 `timeout` 内等待恢复信号，
/// 超时或被取消返回 `false`。无论哪条路径，订阅都会在返回前释放。
pub async fn await_network(
    signal: &dyn ConnectivitySignal,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
) -> bool {
    if is_online(signal) {
        return true;
    }

    let Some(mut receiver) = signal.subscribe() else {
        return true;
    };

    debug!("Offline, waiting up to {:?} for connectivity", timeout);

    let restored = tokio::select! {
        result = receiver.wait_for(|online| *online) => result.is_ok(),
        _ = tokio::time::sleep(timeout) => false,
        _ = cancelled(cancel) => false,
    };

    drop(receiver);

    if restored {
        debug!("Connectivity restored");
    } else {
        debug!("Gave up waiting for connectivity");
    }

    restored
}
