use tessera_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under many short-lived buffers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, storage, routes)
    let app = tessera_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    tessera_api::setup::server::start_server(&config, app).await?;

    Ok(())
}
