//! The escaped and decoded forms of a request path.
//!
//! The escaped path is the path component of the request URI, exactly as it will be sent
//! downstream. The decoded path lives in the request extensions as a [`DecodedPath`] once
//! something has rewritten the escaped path, and is always the single percent-unescaping of it.
//! Decoded paths are bytes: `%E9` is a valid escape even though it is not UTF-8 on its own.

use std::borrow::Cow;
use std::str;

use http::uri::PathAndQuery;
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{PathDecodingError, RewriteError};

/// Header that accumulates the escaped path seen before each rewrite.
pub const REPLACED_PATH_HEADER: &str = "X-Replaced-Path";

/// Bytes left alone when escaping a path: unreserved characters, `/` and the sub-delimiters
/// that are meaningful inside path segments.
const PATH: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b',')
    .remove(b':')
    .remove(b';')
    .remove(b'=')
    .remove(b'@');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPath(Vec<u8>);

impl DecodedPath {
    pub fn new(path: impl Into<Vec<u8>>) -> Self {
        DecodedPath(path.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_str(&self) -> Option<&str> {
        str::from_utf8(&self.0).ok()
    }
}

/// The host the request was addressed to: the `Host` header, falling back to the URI authority.
pub fn host<B>(request: &http::Request<B>) -> &str {
    request
        .headers()
        .get(http::header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(|authority| authority.as_str()))
        .unwrap_or("")
}

/// The path as it appears on the wire.
///
/// If the URI carries no path (authority-form targets), it is re-derived from the decoded path.
pub fn escaped_path<B>(request: &http::Request<B>) -> Cow<'_, str> {
    let path = request.uri().path();
    if !path.is_empty() {
        return Cow::Borrowed(path);
    }

    match request.extensions().get::<DecodedPath>() {
        Some(decoded) => Cow::Owned(escape(decoded.as_bytes())),
        None => Cow::Borrowed(path),
    }
}

pub fn decoded_path<B>(request: &http::Request<B>) -> Result<Cow<'_, [u8]>, PathDecodingError> {
    match request.extensions().get::<DecodedPath>() {
        Some(decoded) => Ok(Cow::Borrowed(decoded.as_bytes())),
        None => unescape(request.uri().path()).map(Cow::Owned),
    }
}

/// Percent-decodes a path exactly once.
///
/// Every `%` must start a two digit hex escape, and `+` is left alone.
pub fn unescape(raw: &str) -> Result<Vec<u8>, PathDecodingError> {
    let bytes = raw.as_bytes();
    let mut index = 0;
    while let Some(offset) = bytes[index..].iter().position(|&b| b == b'%') {
        let rest = &bytes[index + offset..];
        if rest.len() < 3 || !rest[1].is_ascii_hexdigit() || !rest[2].is_ascii_hexdigit() {
            let sequence = &rest[..rest.len().min(3)];
            return Err(PathDecodingError::InvalidEscape(
                String::from_utf8_lossy(sequence).into_owned(),
            ));
        }
        index += offset + 3;
    }

    Ok(percent_decode_str(raw).collect())
}

/// Escapes a decoded path, keeping `/` separators and path sub-delimiters.
pub fn escape(decoded: &[u8]) -> String {
    percent_encode(decoded, PATH).to_string()
}

/// Builds the request-target for a rewritten path, keeping `query` untouched.
///
/// `raw` is used verbatim when it is a valid escaped path. Otherwise the target is
/// re-escaped from `decoded`, which still unescapes back to `decoded`.
pub fn request_target(
    raw: &str,
    decoded: &[u8],
    query: Option<&str>,
) -> Result<PathAndQuery, RewriteError> {
    let path = if is_valid_encoded(raw) {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(escape(decoded))
    };

    let mut target = String::with_capacity(path.len() + query.map_or(0, |query| query.len() + 1));
    if path.is_empty() {
        target.push('/');
    } else {
        target.push_str(&path);
    }
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }

    target
        .parse()
        .map_err(|err: http::uri::InvalidUri| RewriteError::RequestTarget {
            target: target.clone(),
            source: err.into(),
        })
}

fn is_valid_encoded(path: &str) -> bool {
    path.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'-' | b'_' | b'.' | b'~' | b'/' | b'%' | b'!' | b'$' | b'&' | b'\'' | b'('
                    | b')' | b'*' | b'+' | b',' | b';' | b'=' | b':' | b'@' | b'[' | b']'
            )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> http::Request<()> {
        http::Request::builder().uri(uri).body(()).unwrap()
    }

    #[test]
    fn unescape_decodes_once() {
        assert_eq!(unescape("/a%2Fb").unwrap(), b"/a/b");
        assert_eq!(unescape("/caf%C3%A9").unwrap(), "/café".as_bytes());
        assert_eq!(unescape("/a%252Fb").unwrap(), b"/a%2Fb");
        assert_eq!(unescape("/a+b").unwrap(), b"/a+b");
    }

    #[test]
    fn unescape_rejects_bad_escapes() {
        assert_eq!(
            unescape("/api/%zz/x").unwrap_err(),
            PathDecodingError::InvalidEscape("%zz".to_owned())
        );
        assert_eq!(
            unescape("/api/%4").unwrap_err(),
            PathDecodingError::InvalidEscape("%4".to_owned())
        );
        assert_eq!(
            unescape("/api/%").unwrap_err().to_string(),
            "invalid URL escape \"%\""
        );
    }

    #[test]
    fn unescape_keeps_non_utf8_bytes() {
        let decoded = unescape("/caf%E9/%FF").unwrap();
        assert_eq!(decoded, b"/caf\xE9/\xFF");
        assert_eq!(escape(&decoded), "/caf%E9/%FF");
        assert_eq!(DecodedPath::new(decoded).to_str(), None);
    }

    #[test]
    fn escape_keeps_separators() {
        assert_eq!(escape(b"/a b/c?d"), "/a%20b/c%3Fd");
        assert_eq!(escape("/über".as_bytes()), "/%C3%BCber");
        assert_eq!(unescape(&escape(b"/x#y%z")).unwrap(), b"/x#y%z");
    }

    #[test]
    fn escape_keeps_sub_delimiters() {
        assert_eq!(escape(b"/user@host:8080/a;b=c,d&e+f$"), "/user@host:8080/a;b=c,d&e+f$");
        assert_eq!(escape(b"/(x)!*'[y]"), "/%28x%29%21%2A%27%5By%5D");
    }

    #[test]
    fn host_prefers_header() {
        let with_header = http::Request::builder()
            .uri("http://authority.example.com/x")
            .header(http::header::HOST, "header.example.com")
            .body(())
            .unwrap();
        assert_eq!(host(&with_header), "header.example.com");
        assert_eq!(
            host(&request("http://authority.example.com/x")),
            "authority.example.com"
        );
        assert_eq!(host(&request("/x")), "");
    }

    #[test]
    fn decoded_path_prefers_extension() {
        let mut request = request("/a%2Fb");
        assert_eq!(&*decoded_path(&request).unwrap(), b"/a/b");
        request.extensions_mut().insert(DecodedPath::new("/other"));
        assert_eq!(&*decoded_path(&request).unwrap(), b"/other");
    }

    #[test]
    fn escaped_path_falls_back_to_decoded() {
        let mut request = request("example.com:443");
        assert_eq!(escaped_path(&request), "");
        request.extensions_mut().insert(DecodedPath::new("/a b"));
        assert_eq!(escaped_path(&request), "/a%20b");
    }

    #[test]
    fn request_target_keeps_query() {
        let target = request_target("/a%2Fb", b"/a/b", Some("x=1&y=%20")).unwrap();
        assert_eq!(target.as_str(), "/a%2Fb?x=1&y=%20");
        assert_eq!(request_target("", b"", None).unwrap().as_str(), "/");
    }

    #[test]
    fn request_target_reescapes_invalid_raw_path() {
        let target = request_target("/a b?c", b"/a b?c", Some("q")).unwrap();
        assert_eq!(target.path(), "/a%20b%3Fc");
        assert_eq!(target.query(), Some("q"));
    }
}
