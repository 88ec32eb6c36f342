use axum_server::tls_rustls::RustlsConfig;
use family_api::settings::Settings;
use family_api::storage_manager::StorageManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Settings::new("config.toml")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(?config, "configuration loaded");

    let storage_manager = Arc::new(StorageManager::new(&config.database).await?);
    let app = family_api::router(storage_manager);
    let addr: SocketAddr = config.socket_addr().parse()?;

    match &config.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;

            info!("listening on https://{addr}");
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("listening on http://{addr}");
            axum_server::bind(addr).serve(app.into_make_service()).await?;
        }
    }

    Ok(())
}
