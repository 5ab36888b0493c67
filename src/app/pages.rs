//! Fixed HTML banner pages.

use tokio::io::AsyncWrite;

use crate::http::response::{default_headers, HandlerError, StatusCode};
use crate::http::writer::ResponseWriter;

pub struct Page {
    pub status: StatusCode,
    pub html: &'static str,
}

pub const SUCCESS: Page = Page {
    status: StatusCode::OK,
    html: "<html>
<head>
<title>200 OK</title>
</head>
<body>
<h1>Success!</h1>
<p>Your request was received and handled.</p>
</body>
</html>
",
};

pub const BAD_REQUEST: Page = Page {
    status: StatusCode::BAD_REQUEST,
    html: "<html>
<head>
<title>400 Bad Request</title>
</head>
<body>
<h1>Bad Request</h1>
<p>The server could not make sense of that request.</p>
</body>
</html>
",
};

pub const INTERNAL_ERROR: Page = Page {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    html: "<html>
<head>
<title>500 Internal Server Error</title>
</head>
<body>
<h1>Internal Server Error</h1>
<p>Something went wrong on our side.</p>
</body>
</html>
",
};

impl Page {
    pub async fn write<W>(&self, w: &mut ResponseWriter<W>) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut headers = default_headers(self.html.len());
        headers.replace("Content-Type", "text/html");

        w.write_status_line(self.status).await?;
        w.write_headers(&headers).await?;
        w.write_body(self.html.as_bytes()).await?;
        Ok(())
    }
}
