use rawhttp::http::headers::HeaderError;
use rawhttp::http::parser::{
    parse_request, ParseError, ParseState, Progress, RequestParser, Stage, MAX_HEAD_BYTES,
};

/// Feeds `data` in pieces of `step` bytes and finishes the parser.
fn parse_in_steps(data: &[u8], step: usize) -> Result<rawhttp::http::request::Request, ParseError> {
    let mut parser = RequestParser::new();
    for piece in data.chunks(step) {
        parser.feed(piece)?;
    }
    parser.finish()
}

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.line.method, "GET");
    assert_eq!(parsed.line.target, "/");
    assert_eq!(parsed.line.version, "HTTP/1.1");
    assert_eq!(parsed.headers.get("Host").unwrap(), "example.com");
    assert!(parsed.body.is_empty());
}

#[test]
fn test_parse_post_request_with_body() {
    let req = b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.line.method, "POST");
    assert_eq!(parsed.line.target, "/api");
    assert_eq!(parsed.body, b"hello".to_vec());
}

#[test]
fn test_parse_multiple_headers() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.headers.get("host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("USER-AGENT").unwrap(), "test-client");
    assert_eq!(parsed.headers.get("Accept").unwrap(), "*/*");
    assert_eq!(parsed.headers.len(), 3);
}

#[test]
fn test_parse_repeated_header_is_folded() {
    let req = b"GET / HTTP/1.1\r\nSet-Person: lane-loves-go\r\nSet-Person: prime-loves-zig\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(
        parsed.headers.get("set-person").unwrap(),
        "lane-loves-go, prime-loves-zig"
    );
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.line.target, "/search?q=rust");
}

#[test]
fn test_parse_one_byte_at_a_time_matches_single_shot() {
    let req = b"PUT /items/7 HTTP/1.1\r\nHost: localhost:42069\r\nX-Trace:  abc  \r\nX-Trace: def\r\nContent-Length: 11\r\n\r\nhello world";

    let whole = parse_request(req).unwrap();
    for step in [1, 2, 3, 7, 16, 64] {
        assert_eq!(parse_in_steps(req, step).unwrap(), whole, "step {step}");
    }
    assert_eq!(whole.headers.get("x-trace").unwrap(), "abc, def");
    assert_eq!(whole.body, b"hello world".to_vec());
}

#[test]
fn test_feed_reports_progress() {
    let mut parser = RequestParser::new();

    assert_eq!(parser.feed(b"GET / HT").unwrap(), Progress::NeedMore);
    assert_eq!(parser.state(), &ParseState::ParsingRequestLine);

    assert_eq!(parser.feed(b"TP/1.1\r\nHost: x\r\n").unwrap(), Progress::NeedMore);
    assert_eq!(parser.state(), &ParseState::ParsingHeaders);

    assert_eq!(parser.feed(b"Content-Length: 2\r\n\r\n").unwrap(), Progress::NeedMore);
    assert_eq!(parser.state(), &ParseState::ParsingBody { expected: 2 });

    assert_eq!(parser.feed(b"ok").unwrap(), Progress::Done);
    assert_eq!(parser.state(), &ParseState::Done);
    assert_eq!(parser.bytes_received(), 48);

    let req = parser.finish().unwrap();
    assert_eq!(req.body, b"ok".to_vec());
}

#[test]
fn test_bytes_after_body_are_ignored() {
    let req = b"POST / HTTP/1.1\r\nContent-Length: 3\r\n\r\nabcdef";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.body, b"abc".to_vec());
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_request(req);

    assert_eq!(result, Err(ParseError::Truncated { stage: Stage::Headers }));
}

#[test]
fn test_parse_incomplete_request_line() {
    let result = parse_request(b"GET / HTTP/1.1");

    assert_eq!(result, Err(ParseError::Truncated { stage: Stage::RequestLine }));
}

#[test]
fn test_parse_incomplete_request_partial_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel";
    let result = parse_request(req);

    assert_eq!(result, Err(ParseError::Truncated { stage: Stage::Body }));
}

#[test]
fn test_parse_lowercase_method_rejected() {
    let result = parse_request(b"get / HTTP/1.1\r\n\r\n");

    assert_eq!(result, Err(ParseError::InvalidMethod("get".to_string())));
}

#[test]
fn test_parse_wrong_token_count_rejected() {
    for line in [
        "/coffee HTTP/1.1",
        "GET /coffee",
        "GET /coffee HTTP/1.1 extra",
        "GET  /coffee HTTP/1.1",
    ] {
        let req = format!("{line}\r\nHost: x\r\n\r\n");
        let result = parse_request(req.as_bytes());
        assert!(
            matches!(result, Err(ParseError::MalformedRequestLine(_))),
            "{line:?} gave {result:?}"
        );
    }
}

#[test]
fn test_parse_unsupported_version_rejected() {
    let result = parse_request(b"GET / HTTP/1.0\r\n\r\n");
    assert_eq!(result, Err(ParseError::UnsupportedVersion("HTTP/1.0".to_string())));

    let result = parse_request(b"GET / HTTP/2\r\n\r\n");
    assert!(matches!(result, Err(ParseError::UnsupportedVersion(_))));
}

#[test]
fn test_parse_malformed_header() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n";
    let result = parse_request(req);

    assert_eq!(result, Err(ParseError::Header(HeaderError::MissingColon)));
}

#[test]
fn test_parse_header_with_space_before_colon() {
    let req = b"GET / HTTP/1.1\r\nHost : localhost\r\n\r\n";
    let result = parse_request(req);

    assert!(matches!(
        result,
        Err(ParseError::Header(HeaderError::WhitespaceBeforeColon(_)))
    ));
}

#[test]
fn test_error_state_is_sticky() {
    let mut parser = RequestParser::new();
    let err = parser.feed(b"get / HTTP/1.1\r\n").unwrap_err();

    assert_eq!(parser.state(), &ParseState::Error(err.clone()));
    assert_eq!(parser.feed(b"Host: x\r\n\r\n"), Err(err.clone()));
    assert_eq!(parser.finish(), Err(err));
}

#[test]
fn test_parse_various_http_methods() {
    for method in ["GET", "POST", "PUT", "DELETE", "HEAD", "OPTIONS", "PATCH", "BREW"] {
        let req = format!("{method} / HTTP/1.1\r\n\r\n");
        let parsed = parse_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.line.method, method);
    }
}

#[test]
fn test_parse_request_with_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: 0\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.body.len(), 0);
}

#[test]
fn test_unparseable_content_length_means_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: lots\r\n\r\n";
    let parsed = parse_request(req).unwrap();

    assert!(parsed.body.is_empty());
    assert_eq!(parsed.content_length(), None);
}

#[test]
fn test_parse_request_with_binary_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let parsed = parse_request(req).unwrap();

    assert_eq!(parsed.body, vec![0x00, 0x01, 0x02, 0x03]);
}

#[test]
fn test_oversized_head_rejected_whole_or_in_pieces() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    for i in 0..1000 {
        req.extend_from_slice(format!("X-H{i}: {}\r\n", "v".repeat(80)).as_bytes());
    }
    req.extend_from_slice(b"\r\n");
    assert!(req.len() > MAX_HEAD_BYTES);

    assert_eq!(parse_request(&req).err(), Some(ParseError::HeadTooLarge));
    assert_eq!(parse_in_steps(&req, 1024).err(), Some(ParseError::HeadTooLarge));
}

#[test]
fn test_head_at_limit_is_accepted() {
    let mut req = b"GET / HTTP/1.1\r\n".to_vec();
    let filler = MAX_HEAD_BYTES - req.len() - "X-Fill: \r\n\r\n".len();
    req.extend_from_slice(format!("X-Fill: {}\r\n\r\n", "v".repeat(filler)).as_bytes());
    assert_eq!(req.len(), MAX_HEAD_BYTES);

    assert!(parse_request(&req).is_ok());
    assert!(parse_in_steps(&req, 1024).is_ok());
}

#[test]
fn test_signed_content_length_means_empty_body() {
    let req = b"POST /api HTTP/1.1\r\nContent-Length: +3\r\n\r\nabc";
    let parsed = parse_request(req).unwrap();

    assert!(parsed.body.is_empty());
    assert_eq!(parsed.content_length(), None);
}
