use rawhttp::http::headers::Headers;
use rawhttp::http::response::{default_headers, StatusCode};
use rawhttp::http::writer::{ResponseWriter, WriterError, WriterState};

/// Writer positioned at the body with nothing written yet.
async fn body_writer() -> ResponseWriter<Vec<u8>> {
    let mut w = ResponseWriter::new(Vec::new());
    w.write_status_line(StatusCode::OK).await.unwrap();
    w.write_headers(&Headers::new()).await.unwrap();
    w
}

fn body_of(w: ResponseWriter<Vec<u8>>) -> String {
    let out = String::from_utf8(w.into_inner()).unwrap();
    out.strip_prefix("HTTP/1.1 200 OK\r\n\r\n").unwrap().to_string()
}

#[tokio::test]
async fn test_full_response_serialization() {
    let mut w = ResponseWriter::new(Vec::new());
    assert_eq!(w.state(), WriterState::ExpectStatusLine);

    w.write_status_line(StatusCode::OK).await.unwrap();
    assert_eq!(w.state(), WriterState::ExpectHeaders);

    w.write_headers(&default_headers(5)).await.unwrap();
    assert_eq!(w.state(), WriterState::ExpectBody);

    w.write_body(b"hel").await.unwrap();
    w.write_body(b"lo").await.unwrap();
    assert_eq!(w.state(), WriterState::ExpectBody);

    assert_eq!(
        String::from_utf8(w.into_inner()).unwrap(),
        "HTTP/1.1 200 OK\r\n\
         content-length: 5\r\n\
         connection: close\r\n\
         content-type: text/plain\r\n\
         \r\n\
         hello"
    );
}

#[tokio::test]
async fn test_status_line_for_each_code() {
    for (status, line) in [
        (StatusCode::OK, "HTTP/1.1 200 OK\r\n"),
        (StatusCode::BAD_REQUEST, "HTTP/1.1 400 Bad Request\r\n"),
        (StatusCode::INTERNAL_SERVER_ERROR, "HTTP/1.1 500 Internal Server Error\r\n"),
        (StatusCode::new(418), "HTTP/1.1 418 Client Error\r\n"),
    ] {
        let mut w = ResponseWriter::new(Vec::new());
        w.write_status_line(status).await.unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), line);
    }
}

#[tokio::test]
async fn test_headers_before_status_line_rejected() {
    let mut w = ResponseWriter::new(Vec::new());
    let err = w.write_headers(&default_headers(0)).await.unwrap_err();

    assert!(matches!(
        err,
        WriterError::OutOfOrder {
            state: WriterState::ExpectStatusLine,
            ..
        }
    ));
    assert_eq!(w.state(), WriterState::ExpectStatusLine);
    assert!(w.into_inner().is_empty());
}

#[tokio::test]
async fn test_body_before_headers_rejected() {
    let mut w = ResponseWriter::new(Vec::new());
    assert!(w.write_body(b"x").await.is_err());
    assert!(w.write_chunked_body(b"x").await.is_err());

    w.write_status_line(StatusCode::OK).await.unwrap();
    assert!(matches!(
        w.write_body(b"x").await,
        Err(WriterError::OutOfOrder {
            state: WriterState::ExpectHeaders,
            ..
        })
    ));
    assert!(w.write_chunked_body_done().await.is_err());
    assert!(w.write_trailers(&Headers::new()).await.is_err());

    assert_eq!(
        String::from_utf8(w.into_inner()).unwrap(),
        "HTTP/1.1 200 OK\r\n"
    );
}

#[tokio::test]
async fn test_sections_cannot_repeat() {
    let mut w = body_writer().await;

    assert!(w.write_status_line(StatusCode::OK).await.is_err());
    assert!(w.write_headers(&Headers::new()).await.is_err());
    assert_eq!(w.state(), WriterState::ExpectBody);
}

#[tokio::test]
async fn test_chunked_body_with_terminator() {
    let mut w = body_writer().await;

    w.write_chunked_body(b"abc").await.unwrap();
    w.write_chunked_body(b"de").await.unwrap();
    w.write_chunked_body_done().await.unwrap();

    assert_eq!(body_of(w), "3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n");
}

#[tokio::test]
async fn test_chunk_length_is_hex() {
    let mut w = body_writer().await;
    let chunk = vec![b'x'; 255];

    w.write_chunked_body(&chunk).await.unwrap();

    let body = body_of(w);
    assert!(body.starts_with("ff\r\nxxx"));
    assert!(body.ends_with("x\r\n"));
    assert_eq!(body.len(), 4 + 255 + 2);
}

#[tokio::test]
async fn test_empty_chunk_writes_nothing() {
    let mut w = body_writer().await;

    w.write_chunked_body(b"").await.unwrap();

    assert_eq!(body_of(w), "");
}

#[tokio::test]
async fn test_trailers_terminate_chunked_body() {
    let mut w = body_writer().await;
    let trailers: Headers = [("X-Len", "5")].into_iter().collect();

    w.write_chunked_body(b"hello").await.unwrap();
    w.write_trailers(&trailers).await.unwrap();

    assert_eq!(body_of(w), "5\r\nhello\r\n0\r\nx-len: 5\r\n\r\n");
}

#[tokio::test]
async fn test_multiple_trailers_in_order() {
    let mut w = body_writer().await;
    let mut trailers = Headers::new();
    trailers.set("X-Content-SHA256", "abc123");
    trailers.set("X-Content-Length", "0");

    w.write_trailers(&trailers).await.unwrap();

    assert_eq!(
        body_of(w),
        "0\r\nx-content-sha256: abc123\r\nx-content-length: 0\r\n\r\n"
    );
}

#[tokio::test]
async fn test_trailers_rejected_after_terminator() {
    let mut w = body_writer().await;
    let trailers: Headers = [("X-Len", "3")].into_iter().collect();

    w.write_chunked_body(b"abc").await.unwrap();
    w.write_chunked_body_done().await.unwrap();
    assert!(w.is_finished());

    let result = w.write_trailers(&trailers).await;
    assert!(matches!(
        result,
        Err(WriterError::Finished { operation: "trailers" })
    ));
    assert!(w.write_chunked_body_done().await.is_err());

    assert_eq!(body_of(w), "3\r\nabc\r\n0\r\n\r\n");
}

#[tokio::test]
async fn test_body_rejected_after_trailers() {
    let mut w = body_writer().await;
    let trailers: Headers = [("X-Len", "3")].into_iter().collect();

    w.write_chunked_body(b"abc").await.unwrap();
    w.write_trailers(&trailers).await.unwrap();

    assert!(matches!(
        w.write_chunked_body(b"zz").await,
        Err(WriterError::Finished { .. })
    ));
    assert!(matches!(
        w.write_body(b"raw").await,
        Err(WriterError::Finished { .. })
    ));
    assert_eq!(w.state(), WriterState::ExpectBody);

    assert_eq!(body_of(w), "3\r\nabc\r\n0\r\nx-len: 3\r\n\r\n");
}
