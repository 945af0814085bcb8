use portal_core::Config;

// Use mimalloc as the global allocator for lower fragmentation under many
// short-lived multipart buffers, especially on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = portal_api::setup::initialize_app(config.clone()).await?;

    portal_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
