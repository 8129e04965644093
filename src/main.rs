use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use it_desk::{config::Config, routes, services::Database, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "it_desk=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting IT Desk service...");

    // 加载配置
    let config = Config::from_env()?;
    if config.is_production() {
        info!("Running in production mode");
    }

    // 数据库不可用时依然启动，数据接口返回 503
    let db = Arc::new(Database::new(&config).await);

    // 创建应用状态
    let app_state = Arc::new(AppState::new(config.clone(), db).await?);
    let app = routes::build_app(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
