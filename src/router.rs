//! Page router backed by the console location URL.

use url::Url;

use crate::error::Result;
use crate::page::{DEFAULT_PAGE_ID, Page};

const PAGE_PARAM: &str = "page";
const USER_ID_PARAM: &str = "userID";
const INVITATION_PARAM: &str = "invitation_id";

/// Holds the location and the page selected from its `page` parameter.
///
/// Any identifier is accepted; the URL keeps it verbatim while
/// [`Router::page`] resolves it through [`Page::from_id`].
#[derive(Debug, Clone)]
pub struct Router {
    location: Url,
    page_id: String,
}

impl Router {
    /// Derive the initial page from the location's query string.
    pub fn new(location: Url) -> Self {
        let page_id = query_value(&location, PAGE_PARAM)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE_ID.to_string());
        Self { location, page_id }
    }

    /// Parse `location` and derive the initial page.
    pub fn parse(location: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(location)?))
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Raw page identifier as written in the URL.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }

    pub fn page(&self) -> Page {
        Page::from_id(&self.page_id)
    }

    /// First value of query parameter `name`.
    pub fn query_param(&self, name: &str) -> Option<String> {
        query_value(&self.location, name)
    }

    /// The `userID` query parameter, if non-empty.
    pub fn user_id(&self) -> Option<String> {
        self.query_param(USER_ID_PARAM).filter(|id| !id.is_empty())
    }

    /// The `invitation_id` query parameter, if non-empty.
    pub fn invitation_id(&self) -> Option<String> {
        self.query_param(INVITATION_PARAM).filter(|id| !id.is_empty())
    }

    /// Switch to `page_id` and rewrite the `page` parameter in place.
    ///
    /// The first `page` pair is replaced where it stands, later duplicates
    /// are dropped and the pair is appended if missing. Other parameters
    /// keep their order.
    pub fn update_page(&mut self, page_id: &str) {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut replaced = false;

        for (key, value) in self.location.query_pairs().into_owned() {
            if key == PAGE_PARAM {
                if !replaced {
                    pairs.push((key, page_id.to_string()));
                    replaced = true;
                }
            } else {
                pairs.push((key, value));
            }
        }
        if !replaced {
            pairs.push((PAGE_PARAM.to_string(), page_id.to_string()));
        }

        self.location.query_pairs_mut().clear().extend_pairs(pairs);
        self.page_id = page_id.to_string();
        tracing::debug!("Page changed to '{page_id}' ({})", self.page());
    }
}

fn query_value(location: &Url, name: &str) -> Option<String> {
    location
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
