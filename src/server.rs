//! HTTP surface: `GET /install` on a `may_minihttp` server.
//!
//! Every request runs the sequencer once on a fresh connection inside the
//! request's coroutine. Concurrent requests are serialized by the install lock.

use crate::config::BedrockConfig;
use crate::install::{self, InstallationReport};
use crate::migration::MigrationRegistry;
use crate::view::render_install_page;
use may_minihttp::{HttpServer, HttpService, Request, Response};
use std::io;
use std::sync::Arc;

#[derive(Clone)]
pub struct InstallService {
    config: Arc<BedrockConfig>,
    catalog: Arc<MigrationRegistry>,
}

/// What a request path resolves to.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    InstallPage,
    InstallJson,
    #[cfg(feature = "metrics")]
    Metrics,
    NotFound,
}

fn route(method: &str, path: &str) -> Route {
    let path = path.split('?').next().unwrap_or("");
    match (method, path) {
        ("GET", "/install") => Route::InstallPage,
        ("GET", "/install.json") => Route::InstallJson,
        #[cfg(feature = "metrics")]
        ("GET", "/metrics") => Route::Metrics,
        _ => Route::NotFound,
    }
}

impl InstallService {
    pub fn new(config: Arc<BedrockConfig>, catalog: Arc<MigrationRegistry>) -> Self {
        Self { config, catalog }
    }

    fn run_install(&self) -> InstallationReport {
        install::install(&self.config, self.catalog.as_ref())
    }
}

impl HttpService for InstallService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let route = route(req.method(), req.path());
        log::debug!("{} {} -> {:?}", req.method(), req.path(), route);

        match route {
            Route::InstallPage => {
                let report = self.run_install();
                res.header("Content-Type: text/html; charset=utf-8");
                res.status_code(200, "OK");
                res.body_vec(render_install_page(&report).into_bytes());
            }
            Route::InstallJson => {
                let report = self.run_install();
                let body = report
                    .to_json()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                res.header("Content-Type: application/json");
                res.status_code(200, "OK");
                res.body_vec(body.into_bytes());
            }
            #[cfg(feature = "metrics")]
            Route::Metrics => {
                let body = crate::metrics::render()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                res.header("Content-Type: text/plain; version=0.0.4; charset=utf-8");
                res.status_code(200, "OK");
                res.body_vec(body.into_bytes());
            }
            Route::NotFound => {
                res.status_code(404, "Not Found");
                res.body("Not Found");
            }
        }
        Ok(())
    }
}

/// Start the server on `config.server.bind` and block until it exits.
pub fn serve(config: BedrockConfig, catalog: MigrationRegistry) -> io::Result<()> {
    let bind = config.server.bind.clone();
    let service = InstallService::new(Arc::new(config), Arc::new(catalog));

    let server = HttpServer(service).start(&bind)?;
    log::info!("install server listening on http://{}/install", bind);
    server
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "install server thread panicked"))
}
