//! The per-request input to the matcher.
//!
//! A [`RequestDescriptor`] holds only what matching looks at: path segments,
//! method, query parameters, headers, and the two content-negotiation fields.
//! Build one from a parsed `http` request with
//! [`RequestDescriptor::from_http`], or by hand in tests.

use http::header::{ACCEPT, CONTENT_TYPE};

use crate::media::{self, MediaType};
use crate::method::Method;
use crate::path::split_path;

#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    segments: Vec<String>,
    method: Option<Method>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    content_type: Option<MediaType>,
    accept: Vec<MediaType>,
}

impl RequestDescriptor {
    /// Starts a descriptor for `target`, a path with an optional query string
    /// (`/mapping-param?mode=debug`).
    pub fn new(method: Method, target: &str) -> Self {
        Self::with_method(Some(method), target)
    }

    fn with_method(method: Option<Method>, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            segments: split_path(path),
            method,
            query: parse_query(query),
            headers: Vec::new(),
            content_type: None,
            accept: Vec::new(),
        }
    }

    /// Extracts a descriptor from request head. Extension methods become
    /// `None` and only match `ANY` routes. Headers that are not valid UTF-8
    /// are skipped. An unparsable `Content-Type` counts as absent.
    pub fn from_http(parts: &http::request::Parts) -> Self {
        let target = parts.uri.path_and_query().map_or("/", |pq| pq.as_str());
        let mut desc = Self::with_method(Method::try_from(&parts.method).ok(), target);

        for (name, value) in &parts.headers {
            if let Ok(value) = value.to_str() {
                desc.headers.push((name.as_str().to_owned(), value.to_owned()));
            }
        }
        desc.content_type = desc.first_header(CONTENT_TYPE.as_str())
            .and_then(|v| MediaType::parse(v).ok());
        let accept = desc.header_values(ACCEPT.as_str()).collect::<Vec<_>>().join(",");
        desc.accept = media::parse_accept(&accept);
        desc
    }

    /// Adds a header. Setting `content-type` or `accept` this way also
    /// updates the negotiation fields.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name == CONTENT_TYPE.as_str() {
            self.content_type = MediaType::parse(value).ok();
        } else if name == ACCEPT.as_str() {
            self.accept.extend(media::parse_accept(value));
        }
        self.headers.push((name, value.to_owned()));
        self
    }

    pub fn content_type(self, media: &str) -> Self {
        self.header(CONTENT_TYPE.as_str(), media)
    }

    pub fn accept(self, media: &str) -> Self {
        self.header(ACCEPT.as_str(), media)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn content_type_media(&self) -> Option<&MediaType> {
        self.content_type.as_ref()
    }

    pub fn accept_media(&self) -> &[MediaType] {
        &self.accept
    }

    /// Every value of query parameter `name`, in request order. Names are
    /// case-sensitive.
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.query.iter().filter(move |(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Every value of header `name`. Names are case-insensitive.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.headers.iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn first_header<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.header_values(name).next()
    }

    pub(crate) fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
