use std::path::Path;

use tokio::io::AsyncWrite;

use crate::http::response::{default_headers, HandlerError, StatusCode};
use crate::http::writer::ResponseWriter;

/// Streams the file at `path` as `video/mp4`.
pub async fn serve<W>(w: &mut ResponseWriter<W>, path: &Path) -> Result<(), HandlerError>
where
    W: AsyncWrite + Unpin,
{
    let data = tokio::fs::read(path).await.map_err(|e| {
        tracing::warn!(path = %path.display(), error = %e, "video asset unavailable");
        HandlerError::internal(format!("failed to read {}: {e}", path.display()))
    })?;

    let mut headers = default_headers(data.len());
    headers.replace("Content-Type", "video/mp4");

    w.write_status_line(StatusCode::OK).await?;
    w.write_headers(&headers).await?;
    w.write_body(&data).await?;
    Ok(())
}
