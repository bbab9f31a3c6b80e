use headers::{ContentType, HeaderMapExt};
use hyper::Body;

pub fn from_status(status: http::StatusCode) -> http::Response<Body> {
    let mut response = http::Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

/// A plain text error response, with the message terminated by a newline.
pub fn text(status: http::StatusCode, message: &str) -> http::Response<Body> {
    let mut response = http::Response::new(Body::from(format!("{}\n", message)));
    *response.status_mut() = status;
    response.headers_mut().typed_insert(ContentType::text_utf8());
    response.headers_mut().insert(
        http::header::X_CONTENT_TYPE_OPTIONS,
        http::HeaderValue::from_static("nosniff"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn text_response() {
        let response = text(http::StatusCode::INTERNAL_SERVER_ERROR, "invalid URL escape \"%zz\"");
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers()[http::header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"invalid URL escape \"%zz\"\n");
    }
}
