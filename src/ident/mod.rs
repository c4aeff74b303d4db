//! Page identifiers: validated paths into the page hierarchy

use crate::error::PageError;
use std::path::PathBuf;

const MAX_PATH_LEN: usize = 512;
const MAX_IDENT_DEPTH: usize = 32;

/// A page identifier. An ordered list of path elements naming a page (or
/// page group) in the content store, each element validated against
/// directory traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageIdent {
    elements: Vec<String>,
}

/// Validate one path component. Avoid any directory change.
pub fn validate_safe_name(name: &str) -> Result<&str, PageError> {
    if name.is_empty() || name.starts_with('.') {
        // No ".", ".." and hidden files.
        return Err(PageError::not_found("Invalid page path"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(PageError::not_found("Invalid page path"));
    }
    Ok(name)
}

/// Validate a relative path. Avoid going back in the hierarchy.
pub fn validate_safe_path(path: &str) -> Result<&str, PageError> {
    for component in path.split('/') {
        validate_safe_name(component)?;
    }
    Ok(path)
}

/// Validate a page name. Names starting with "__" are reserved for system
/// folders and are only accepted when `allow_sys_names` is set.
pub fn validate_page_name(name: &str, allow_sys_names: bool) -> Result<&str, PageError> {
    if name.starts_with("__") && !allow_sys_names {
        return Err(PageError::not_found("Invalid page name"));
    }
    validate_safe_name(name)
}

impl PageIdent {
    /// The root of the page hierarchy.
    pub fn root() -> PageIdent {
        PageIdent { elements: vec![] }
    }

    /// Build an identifier from individual path elements, validating each.
    pub fn new<I, S>(elements: I) -> Result<PageIdent, PageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut validated = Vec::new();
        for element in elements {
            let element = element.as_ref();
            validate_page_name(element, false)?;
            validated.push(element.to_string());
        }
        Ok(PageIdent {
            elements: validated,
        })
    }

    /// Parse a page identifier from a request-style path such as
    /// "about/team.html". Empty paths and "index" refer to the root page.
    pub fn parse(path: &str) -> Result<PageIdent, PageError> {
        if path.len() > MAX_PATH_LEN {
            return Err(PageError::bad_request("Invalid URL"));
        }

        let mut path = path.trim_matches(|c| c == ' ' || c == '\t' || c == '/');

        // Remove page file extensions like .html and such.
        for suffix in [".html", ".htm", ".php"] {
            if let Some(stripped) = path.strip_suffix(suffix) {
                path = stripped;
                break;
            }
        }

        if path.is_empty() || path == "index" {
            return Ok(PageIdent::root());
        }

        let ident = PageIdent::new(path.split('/'))?;
        if ident.len() > MAX_IDENT_DEPTH {
            return Err(PageError::bad_request("Invalid URL"));
        }
        Ok(ident)
    }

    /// A child of this page, one level deeper.
    pub fn child(&self, name: &str) -> Result<PageIdent, PageError> {
        validate_page_name(name, false)?;
        let mut elements = self.elements.clone();
        elements.push(name.to_string());
        Ok(PageIdent { elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[String] {
        &self.elements
    }

    /// The page identifier as a URL below `url_base`. Non-root pages get a
    /// ".html" suffix; the root page with an empty base yields an empty
    /// string, so a bare fragment like "#name" still targets it.
    pub fn url(&self, url_base: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        let base = url_base.trim_matches('/');
        if !base.is_empty() {
            parts.push(base);
        }
        parts.extend(self.elements.iter().map(String::as_str));

        let mut url = String::new();
        for part in &parts {
            url.push('/');
            url.push_str(part);
        }
        if !self.elements.is_empty() {
            url.push_str(".html");
        }
        url
    }

    /// The page identifier as a relative filesystem path. `rstrip` removes
    /// that many trailing elements first, which is how parent scopes are
    /// walked during macro lookup.
    pub fn fs_path(&self, rstrip: usize) -> PathBuf {
        let take = self.elements.len().saturating_sub(rstrip);
        let mut path = PathBuf::new();
        for element in &self.elements[..take] {
            path.push(element);
        }
        path
    }
}
