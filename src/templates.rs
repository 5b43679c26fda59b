//! Template loading and rendering

use std::path::Path;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use log::{debug, trace};
use tera::{Context, Tera};

use crate::error::Result;


/// Collection of page templates
pub struct Templates(Tera);

impl Templates {

    /// Loads every template under `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {

        let pattern = format!("{}/**/*", dir.as_ref().display());
        debug!("loading templates from {}", pattern);

        Ok(Templates(Tera::new(&pattern)?))
    }

    /// Renders the specified template to a `String`
    pub fn render(&self, name: &str, context: &Context) -> Result<String> {
        trace!("rendering template {}", name);
        Ok(self.0.render(name, context)?)
    }

    /// Renders the specified template to a 200 response
    pub fn response(&self, name: &str, context: &Context) -> Result<HttpResponse> {
        self.response_with_status(StatusCode::OK, name, context)
    }

    /// Renders the specified template to a response with `status`
    pub fn response_with_status(
        &self,
        status: StatusCode,
        name: &str,
        context: &Context,
    ) -> Result<HttpResponse> {

        let body = self.render(name, context)?;

        let response = HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(body);

        Ok(response)
    }
}
