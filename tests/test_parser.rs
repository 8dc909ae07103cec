use controller::http::parser::{ParseError, ParseStatus, RequestParser};

fn parse_all(req: &[u8]) -> (Result<ParseStatus, ParseError>, Vec<(String, String)>) {
    let mut fields = Vec::new();
    let result = RequestParser::new().parse(req, |name, value| {
        fields.push((name.to_string(), String::from_utf8_lossy(value).into_owned()));
        Ok(())
    });
    (result, fields)
}

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (result, fields) = parse_all(req);

    let ParseStatus::Complete { line, header_len } = result.unwrap() else {
        panic!("expected complete headers");
    };
    assert_eq!(&req[line.method], b"GET");
    assert_eq!(&req[line.target], b"/");
    assert_eq!(line.query, None);
    assert_eq!(header_len, req.len());
    assert_eq!(fields, vec![("Host".to_string(), "example.com".to_string())]);
}

#[test]
fn test_parse_reports_header_len_before_body() {
    let req = b"PUT /config HTTP/1.0\r\nContent-Length: 5\r\n\r\nhello";
    let (result, _) = parse_all(req);

    let ParseStatus::Complete { header_len, .. } = result.unwrap() else {
        panic!("expected complete headers");
    };
    assert_eq!(&req[header_len..], b"hello");
}

#[test]
fn test_parse_multiple_headers_in_order() {
    let req = b"GET /path HTTP/1.1\r\nHost: example.com\r\nUser-Agent: test-client\r\nAccept: */*\r\n\r\n";
    let (_, fields) = parse_all(req);

    let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Host", "User-Agent", "Accept"]);
    assert_eq!(fields[2].1, "*/*");
}

#[test]
fn test_parse_request_with_query_string() {
    let req = b"GET /search?q=rust HTTP/1.1\r\n\r\n";
    let (result, _) = parse_all(req);

    let ParseStatus::Complete { line, .. } = result.unwrap() else {
        panic!("expected complete headers");
    };
    let query = line.query.unwrap();
    assert_eq!(&req[line.target.start..query], b"/search");
    assert_eq!(&req[line.target], b"/search?q=rust");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let (result, fields) = parse_all(b"GET / HTTP/1.1\r\nHost: example.com\r\n");

    assert_eq!(result.unwrap(), ParseStatus::Partial);
    assert!(fields.is_empty());
}

#[test]
fn test_parse_incomplete_request_line() {
    let (result, _) = parse_all(b"GET /socke");
    assert_eq!(result.unwrap(), ParseStatus::Partial);
}

#[test]
fn test_parse_byte_at_a_time() {
    let req = b"DELETE /applications HTTP/1.1\r\nX-One: 1\r\nX-Two: 2\r\n\r\n";
    let mut parser = RequestParser::new();
    let mut fields = 0;

    for end in 1..req.len() {
        let status = parser
            .parse(&req[..end], |_, _| {
                fields += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(status, ParseStatus::Partial);
    }

    let status = parser
        .parse(req, |_, _| {
            fields += 1;
            Ok(())
        })
        .unwrap();
    assert!(matches!(status, ParseStatus::Complete { header_len, .. } if header_len == req.len()));
    assert_eq!(fields, 2);
}

#[test]
fn test_parse_invalid_method_token() {
    let (result, _) = parse_all(b"GE(T / HTTP/1.1\r\n\r\n");
    assert_eq!(result, Err(ParseError::InvalidMethod));
}

#[test]
fn test_parse_unknown_method_is_not_an_error() {
    let (result, _) = parse_all(b"BREW /pot HTTP/1.1\r\n\r\n");
    assert!(matches!(result, Ok(ParseStatus::Complete { .. })));
}

#[test]
fn test_parse_rejects_bad_request_line_early() {
    // No header terminator yet, but the request line is already garbage.
    let (result, _) = parse_all(b"garbage\r\nHost: x\r\n");
    assert_eq!(result, Err(ParseError::InvalidRequest));
}

#[test]
fn test_parse_rejects_target_without_slash() {
    let (result, _) = parse_all(b"GET sockets HTTP/1.1\r\n\r\n");
    assert_eq!(result, Err(ParseError::InvalidTarget));
}

#[test]
fn test_parse_rejects_unknown_version() {
    let (result, _) = parse_all(b"GET / HTTP/2.0\r\n\r\n");
    assert_eq!(result, Err(ParseError::InvalidVersion));
}

#[test]
fn test_parse_malformed_header() {
    let (result, _) = parse_all(b"GET / HTTP/1.1\r\nBrokenHeader\r\n\r\n");
    assert_eq!(result, Err(ParseError::InvalidHeader));
}

#[test]
fn test_parse_header_value_whitespace_trimmed() {
    let (_, fields) = parse_all(b"GET / HTTP/1.1\r\nContent-Type: \t application/json  \r\n\r\n");
    assert_eq!(fields, vec![("Content-Type".to_string(), "application/json".to_string())]);
}

#[test]
fn test_parse_header_value_with_obs_text() {
    let req = b"GET /sockets HTTP/1.0\r\nUser-Agent: caf\xe9\r\nX-Raw: \xff\xfe \r\n\r\n";
    let mut values = Vec::new();

    let result = RequestParser::new().parse(req, |_, value| {
        values.push(value.to_vec());
        Ok(())
    });

    assert!(matches!(result, Ok(ParseStatus::Complete { header_len, .. }) if header_len == req.len()));
    assert_eq!(values, vec![b"caf\xe9".to_vec(), b"\xff\xfe".to_vec()]);
}

#[test]
fn test_parse_callback_error_aborts() {
    let result = RequestParser::new().parse(b"GET / HTTP/1.1\r\nA: 1\r\nB: 2\r\n\r\n", |name, _| {
        if name == "B" {
            Err(ParseError::InvalidHeader)
        } else {
            Ok(())
        }
    });
    assert_eq!(result, Err(ParseError::InvalidHeader));
}
