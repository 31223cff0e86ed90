use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, warn};

pub async fn listen_for_shutdown() {
    // 等待 Ctrl+C 信号
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
}

/// 停止宽限期扫描；未触发的任务保存在数据库中，下次启动时补触发
pub fn stop_scheduler(task: JoinHandle<()>) {
    task.abort();
    warn!("Grace scheduler stopped");
}
