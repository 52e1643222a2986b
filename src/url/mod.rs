//! URL handling module for Reel-Harvest
//!
//! Every URL the harvester requests is derived from one configured origin:
//! a member's film listing, its numbered pages, and the popular-members
//! directory. Relative links found in listings are resolved here as well.

mod username;

pub use username::{username_from_href, validate_username};

use crate::{UrlError, UrlResult};
use url::Url;

/// URL builder bound to the configured site origin
#[derive(Debug, Clone)]
pub struct SiteUrls {
    origin: Url,
}

impl SiteUrls {
    /// Creates a builder for `origin` (e.g. `https://letterboxd.com`)
    ///
    /// Any path, query or fragment on the origin is discarded.
    pub fn new(origin: &str) -> UrlResult<Self> {
        let mut origin = Url::parse(origin).map_err(|e| UrlError::Parse(e.to_string()))?;

        if origin.scheme() != "http" && origin.scheme() != "https" {
            return Err(UrlError::InvalidScheme(origin.scheme().to_string()));
        }

        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);

        Ok(Self { origin })
    }

    /// The origin every URL is resolved against
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// First page of a member's film listing: `{origin}/{username}/films/`
    pub fn films_url(&self, username: &str) -> UrlResult<Url> {
        validate_username(username)?;
        self.join(&format!("{}/films/", username))
    }

    /// Numbered listing page: `{origin}/{username}/films/page/{n}/`
    pub fn films_page_url(&self, username: &str, page: u32) -> UrlResult<Url> {
        validate_username(username)?;
        self.join(&format!("{}/films/page/{}/", username, page))
    }

    /// Popular-members directory page: `{origin}/members/popular/page/{n}/`
    pub fn popular_members_url(&self, page: u32) -> UrlResult<Url> {
        self.join(&format!("members/popular/page/{}/", page))
    }

    /// Resolves an href found in a listing against the origin
    ///
    /// Returns None for empty hrefs and anything that does not resolve to
    /// an http(s) URL.
    pub fn absolutize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let resolved = self.origin.join(href).ok()?;
        match resolved.scheme() {
            "http" | "https" => Some(resolved.to_string()),
            _ => None,
        }
    }

    fn join(&self, path: &str) -> UrlResult<Url> {
        self.origin
            .join(path)
            .map_err(|e| UrlError::Parse(e.to_string()))
    }
}
