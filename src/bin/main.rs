use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;

use awesome_snippets::config::Config;
use awesome_snippets::{configure, AppState};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr.clone();
    log::info!("relaying to backend at {}", config.backend_url);

    let state = web::Data::new(AppState::new(config).context("failed to build backend client")?);

    log::info!("server listening on http://{}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {}", bind_addr))?
    .run()
    .await
    .context("server terminated")
}
