//! Demonstration application served by the binary.
//!
//! Requests are dispatched on `(method, target)` through [`Route`]; the
//! protocol engine itself knows nothing about these paths.

pub mod pages;
pub mod relay;
pub mod video;

use std::path::PathBuf;

use tokio::io::AsyncWrite;

use crate::config::Config;
use crate::http::request::Request;
use crate::http::response::HandlerError;
use crate::http::writer::ResponseWriter;
use crate::server::handler::Handler;

use relay::RelayClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    BadRequest,
    InternalError,
    /// Path below the relay prefix, without the leading prefix
    Relay(String),
    Video,
}

impl Route {
    pub fn resolve(method: &str, target: &str, relay_prefix: &str) -> Route {
        match (method, target) {
            (_, "/yourproblem") => return Route::BadRequest,
            (_, "/myproblem") => return Route::InternalError,
            ("GET", "/video") => return Route::Video,
            _ => {}
        }

        match target.strip_prefix(relay_prefix) {
            Some(rest) => Route::Relay(rest.to_string()),
            None => Route::Index,
        }
    }
}

pub struct App {
    relay_prefix: String,
    relay: RelayClient,
    video_path: PathBuf,
}

impl App {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            relay_prefix: cfg.relay.prefix.clone(),
            relay: RelayClient::new(&cfg.relay)?,
            video_path: cfg.static_files.video_path.clone(),
        })
    }
}

impl Handler for App {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        match Route::resolve(req.method(), req.target(), &self.relay_prefix) {
            Route::Index => pages::SUCCESS.write(w).await,
            Route::BadRequest => pages::BAD_REQUEST.write(w).await,
            Route::InternalError => pages::INTERNAL_ERROR.write(w).await,
            Route::Relay(path) => self.relay.forward(w, &path).await,
            Route::Video => video::serve(w, &self.video_path).await,
        }
    }
}
