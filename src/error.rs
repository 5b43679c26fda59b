//! Error handling

use std::env::VarError;
use std::io;
use std::result;

use actix_web::{HttpResponse, ResponseError};
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use diesel::r2d2::PoolError;
use diesel_migrations::RunMigrationsError;
use log::error;


/// Error type used throughout CamViewer
#[derive(Debug, Display, From)]
pub enum Error {
    Database(diesel::result::Error),
    Env(VarError),
    Http(reqwest::Error),
    Io(io::Error),
    Json(serde_json::Error),
    Migration(RunMigrationsError),
    Pool(PoolError),
    Template(tera::Error),

    /// Request-level failure with a status and a user-facing message
    #[display(fmt = "{}", _1)]
    #[from(ignore)]
    Web(StatusCode, String),

    /// Request must be sent elsewhere (usually the login page)
    #[display(fmt = "redirecting to {}", _0)]
    #[from(ignore)]
    Redirect(String),
}

impl Error {

    /// Returns a closure mapping any error to `Error::Web` with `status`
    ///
    /// Useful with `map_err` when the cause should be reported to the client
    /// with a specific status instead of a generic server error.
    pub fn with_status<E>(status: StatusCode) -> impl Fn(E) -> Error
    where E: std::fmt::Display
    {
        move |err| Error::Web(status, err.to_string())
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((status, msg): (StatusCode, &str)) -> Self {
        Error::Web(status, msg.to_owned())
    }
}

impl ResponseError for Error {

    fn status_code(&self) -> StatusCode {
        match self {
            Error::Web(status, _) => *status,
            Error::Redirect(_) => StatusCode::FOUND,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Error::Redirect(location) => HttpResponse::Found()
                .insert_header((LOCATION, location.as_str()))
                .finish(),
            Error::Web(status, msg) => HttpResponse::build(*status)
                .body(msg.clone()),
            err => {
                error!("request failed: {}", err);
                HttpResponse::build(self.status_code())
                    .body(err.to_string())
            },
        }
    }
}


/// Result type used throughout CamViewer
pub type Result<T> = result::Result<T, Error>;
