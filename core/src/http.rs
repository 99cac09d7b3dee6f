//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `MoodleRequestBuilder` produces an
//! `HttpRequest` and classifies an `HttpResponse` without touching the
//! network; a `Transport` (or the host itself) performs the round-trip in
//! between. Every Moodle REST call is a GET, so a request is just a URL plus
//! headers.

/// A webservice GET request described as plain data.
///
/// The URL embeds the webservice token, so it must not be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// The query string portion of the URL, without the leading `?`.
    pub fn query(&self) -> &str {
        self.url.split_once('?').map(|(_, q)| q).unwrap_or("")
    }

    /// Query arguments in the order they were assembled, still encoded.
    pub fn query_args(&self) -> Vec<&str> {
        self.query().split('&').filter(|arg| !arg.is_empty()).collect()
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with the given body and no headers.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_args_split_in_order() {
        let req = HttpRequest {
            url: "http://m.test/webservice/rest/server.php?a=1&b=&c=3".to_string(),
            headers: Vec::new(),
        };
        assert_eq!(req.query(), "a=1&b=&c=3");
        assert_eq!(req.query_args(), vec!["a=1", "b=", "c=3"]);
    }

    #[test]
    fn query_is_empty_without_question_mark() {
        let req = HttpRequest {
            url: "http://m.test/".to_string(),
            headers: Vec::new(),
        };
        assert!(req.query_args().is_empty());
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::ok("null").is_success());
        let mut resp = HttpResponse::ok("");
        resp.status = 503;
        assert!(!resp.is_success());
    }
}
