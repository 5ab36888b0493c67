use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::http::connection::Connection;
use crate::server::handler::Handler;

/// Handle to a running accept loop.
///
/// Dropping the handle leaves the loop running; call [`Server::close`] to
/// stop accepting and release the listening socket.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_task: JoinHandle<()>,
}

/// Listens on every interface at `port` and serves each connection with
/// `handler`.
pub async fn serve<H: Handler>(port: u16, handler: H) -> anyhow::Result<Server> {
    bind(&format!("0.0.0.0:{port}"), handler).await
}

/// Listens on `addr` and serves each connection with `handler`.
///
/// Nothing is spawned unless the bind succeeds.
pub async fn bind<H: Handler>(addr: &str, handler: H) -> anyhow::Result<Server> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    info!("Listening on {}", local_addr);

    let closed = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(Notify::new());
    let accept_task = tokio::spawn(accept_loop(
        listener,
        Arc::new(handler),
        closed.clone(),
        shutdown.clone(),
    ));

    Ok(Server {
        local_addr,
        closed,
        shutdown,
        accept_task,
    })
}

impl Server {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the accept loop and waits for it to drop the listener.
    ///
    /// Connections already accepted keep running to completion.
    pub async fn close(self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::Release);
        self.shutdown.notify_one();
        self.accept_task.await.context("accept loop panicked")?;
        Ok(())
    }
}

async fn accept_loop<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,

            res = listener.accept() => match res {
                Ok((socket, peer)) => {
                    debug!("Accepted connection from {}", peer);

                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let mut conn = Connection::new(socket);
                        if let Err(e) = conn.run(handler.as_ref()).await {
                            error!("Connection error from {}: {}", peer, e);
                        }
                    });
                }
                Err(_) if closed.load(Ordering::Acquire) => break,
                Err(e) => error!(error = %e, "failed to accept connection"),
            },
        }
    }

    info!("Accept loop stopped");
}
