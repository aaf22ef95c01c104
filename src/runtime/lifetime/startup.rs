use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::errors::Result;
use crate::resilience::RetryPolicy;
use crate::resolver::AssessmentResolver;
use crate::storage::{DocumentStore, create_storage, seed::import_seed_file};

pub struct StartupContext {
    pub storage: Arc<dyn DocumentStore>,
    pub resolver: Arc<AssessmentResolver>,
}

/// 导入种子数据（如果配置了）
async fn seed_documents(storage: &Arc<dyn DocumentStore>, config: &AppConfig) -> Result<()> {
    let Some(path) = config.seed_file() else {
        debug!("No seed file configured, skipping seed import");
        return Ok(());
    };

    let policy = RetryPolicy::from_config(&config.resilience);
    let imported = import_seed_file(storage.as_ref(), path, &policy).await?;
    if imported == 0 {
        debug!("Seed file {} contained no new documents", path);
    }
    Ok(())
}

/// 准备服务器启动的上下文
/// 包括文档存储、种子数据和解析器
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    let storage = create_storage(config).await?;
    warn!(
        "Storage backend '{}' initialized",
        config.storage.backend
    );

    seed_documents(&storage, config).await?;

    // 服务端进程没有宿主连通性信号，使用默认的 Unmonitored
    let resolver = Arc::new(AssessmentResolver::from_config(storage.clone(), config));
    info!(
        "Assessment resolver ready (max attempts: {}, base delay: {:?})",
        resolver.policy().max_attempts,
        resolver.policy().base_delay
    );

    Ok(StartupContext { storage, resolver })
}
