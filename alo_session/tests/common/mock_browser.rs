use std::collections::HashMap;

use http::header::{COOKIE, SET_COOKIE, USER_AGENT};
use http::{HeaderMap, HeaderValue};

use alo_session::SessionContext;

/// Mock browser for integration testing
///
/// Keeps the cookies it was sent and replays them, with a fixed user agent,
/// on every request.
pub struct MockBrowser {
    user_agent: String,
    cookies: HashMap<String, String>,
}

impl MockBrowser {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            cookies: HashMap::new(),
        }
    }

    /// Same cookie jar, different client
    pub fn impersonate(&self, user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            cookies: self.cookies.clone(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn request_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent).unwrap());
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        }
        headers
    }

    /// Start a request: a fresh context built from this browser's headers
    pub fn context(&self) -> SessionContext {
        SessionContext::from_headers(&self.request_headers())
    }

    /// Apply the `Set-Cookie` headers of a response to the jar
    pub fn receive(&mut self, response: &HeaderMap) {
        for header in response.get_all(SET_COOKIE) {
            let header = header.to_str().unwrap();
            let (pair, attributes) = header.split_once(';').unwrap_or((header, ""));
            let (name, value) = pair.split_once('=').unwrap();

            if attributes.contains("Max-Age=0") || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
}
