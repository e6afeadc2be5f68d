//! Same-origin passthrough for the export: `GET /api/csv` fetches the
//! upstream text and republishes it untouched as `text/csv`.

use std::{net::SocketAddr, sync::Arc};

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, Responder, dev::Server, get, web};
use tracing::{error, info};

use crate::source::CsvSource;

pub struct RelayState {
    source: Arc<dyn CsvSource>,
}

impl RelayState {
    pub fn new(source: Arc<dyn CsvSource>) -> Self {
        Self { source }
    }
}

#[get("/csv")]
async fn csv(state: web::Data<RelayState>) -> impl Responder {
    match state.source.fetch().await {
        Ok(text) => {
            info!(bytes = text.len(), "relayed csv");
            HttpResponse::Ok().content_type("text/csv").body(text)
        }
        Err(err) => {
            error!(source = %state.source.describe(), error = %err, "Error fetching CSV");
            HttpResponse::InternalServerError()
                .content_type("text/plain; charset=utf-8")
                .body("Failed to fetch CSV")
        }
    }
}

/// Route table, shared by [`start`] and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").service(csv));
}

pub fn start(addr: SocketAddr, source: Arc<dyn CsvSource>) -> std::io::Result<Server> {
    let state = web::Data::new(RelayState::new(source));
    let server = HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(addr)?
    .run();
    info!(%addr, "relay listening on /api/csv");
    Ok(server)
}
