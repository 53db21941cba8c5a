use mediad_api::setup;
use mediad_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediad=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let (state, router) = setup::initialize_app(config).await?;
    setup::server::start_server(&state.config, router).await?;

    Ok(())
}
