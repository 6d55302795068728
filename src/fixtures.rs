//! Header fixtures for content negotiation
//!
//! ```text
//! let req = Request::get("/ping").with_headers(accept_json());
//! ```

use crate::response::Headers;

/// `Accept` header for the given mimetype
pub fn accept_mimetype(mimetype: &str) -> Headers {
    vec![("Accept".to_string(), mimetype.to_string())]
}

/// Accept `application/json`
pub fn accept_json() -> Headers {
    accept_mimetype("application/json")
}

/// Accept `application/json-p`
pub fn accept_jsonp() -> Headers {
    accept_mimetype("application/json-p")
}

/// Accept anything
pub fn accept_any() -> Headers {
    accept_mimetype("*/*")
}
