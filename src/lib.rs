
#[macro_use]
extern crate derive_more;

#[macro_use]
extern crate diesel;

#[macro_use]
extern crate diesel_migrations;


pub mod api;
pub mod camera_url;
pub mod config;
pub mod db;
pub mod device;
mod error;
mod locks;
pub mod logging;
pub mod model;
pub mod password;
pub mod poller;
pub mod session;
pub mod storage;
pub mod store;
pub mod templates;
pub mod ui;


pub use error::*;


/// Configures every API and UI route served by CamViewer
///
/// The application must already carry `Data` for the shared store, the
/// templates, the status board and the HTTP client.
pub fn configure(service: &mut actix_web::web::ServiceConfig) {

    service.service(
        actix_web::web::scope("/api")
            .configure(api::configure)
    );

    ui::configure(service);
}
