use anyhow::Result;
use folio_core::{FolioConfig, ENV_PREFIX};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = FolioConfig::with_defaults();
    config.load_env(ENV_PREFIX);
    config.load_supabase_env();

    let app = folio_web::build(config.snapshot()).await?;
    let addr = app.address();

    tracing::info!("folio listening on http://{addr}");

    app.listen(addr).await?;

    Ok(())
}
