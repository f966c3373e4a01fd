use reelhouse_core::Config;

// mimalloc keeps fragmentation down under large upload buffers, especially on musl.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = reelhouse_api::setup::initialize_app(config.clone()).await?;

    reelhouse_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
