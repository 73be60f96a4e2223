use tracing::info;

use craft_protocol::config::ServerConfig;
use craft_protocol::server::Server;
use craft_protocol::utils::logging;

#[tokio::main]
async fn main() -> craft_protocol::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.logging);

    let server = Server::bind(config).await?;
    let handle = server.handle();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            handle.close();
        }
    });

    server.run().await;
    Ok(())
}
