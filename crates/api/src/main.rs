use warden_api::config::ApiConfig;

#[tokio::main]
async fn main() {
    warden_observability::init();

    let config = ApiConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    let app = warden_api::app::build_app(config)
        .await
        .expect("failed to build application");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
