use actix_files::Files;
use actix_web::{App, HttpServer};
use actix_web::middleware::Logger;
use actix_web::web::Data;
use log::info;
use tokio::sync::RwLock;

use camviewer::Result;
use camviewer::config::Config;
use camviewer::db;
use camviewer::device;
use camviewer::logging;
use camviewer::poller::{self, Poller, StatusBoard};
use camviewer::storage::SqliteStorage;
use camviewer::store::Store;
use camviewer::templates::Templates;


#[actix_web::main]
async fn main() -> Result<()> {

    logging::init();

    let config = Config::from_env()?;

    let templates = Data::new(Templates::load(&config.templates_dir)?);
    let pool = db::connect(&config.state_dir)?;

    let mut store = Store::hydrate(Box::new(SqliteStorage::new(pool)), config.auth.clone());
    store.initialize();
    let store = Data::new(RwLock::new(store));

    let client = device::client()?;
    let board = StatusBoard::new();
    let _poller = poller::supervise(store.clone(), Poller::new(client.clone(), board.clone()));

    let client = Data::new(client);
    let board = Data::new(board);
    let static_dir = config.static_dir.clone();

    info!("listening on {}", config.listen);

    HttpServer::new(move || {

            let app = App::new()
                .wrap(Logger::default())
                .app_data(store.clone())
                .app_data(templates.clone())
                .app_data(board.clone())
                .app_data(client.clone());

            let app = match &static_dir {
                Some(dir) => app.service(Files::new("/static", dir)),
                None => app,
            };

            app.configure(camviewer::configure)
        })
        .bind(&config.listen)?
        .run()
        .await?;

    Ok(())
}
