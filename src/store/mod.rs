//! Content store: page bodies, per-scope macro bodies, and named strings

mod cache;
mod filesystem;

pub use cache::MacroCache;
pub use filesystem::FsStore;

use crate::error::PageError;
use crate::ident::PageIdent;

/// A page as stored: its title and raw (unresolved) body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub content: String,
}

/// One visible sub-page entry, for navigation listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubPage {
    pub name: String,
    pub nav_label: String,
    pub priority: i64,
}

/// Access to stored content. The resolver only ever reads; the single
/// shared mutable resource behind an implementation is its macro cache,
/// which `begin_session` clears at a request boundary.
pub trait ContentStore {
    /// Fetch a macro body. The search prefers the page scope, then each
    /// parent scope, then the site-wide macro directory. A missing macro
    /// is an empty string, not an error.
    fn get_macro(&self, name: &str, scope: &PageIdent) -> Result<String, PageError>;

    fn get_page(&self, ident: &PageIdent) -> Result<Page, PageError>;

    fn get_page_title(&self, ident: &PageIdent) -> Result<String, PageError>;

    /// Visible sub-pages of a page group, ordered by priority then label.
    fn get_sub_pages(&self, ident: &PageIdent) -> Result<Vec<SubPage>, PageError>;

    /// A named string from the string table, or the default.
    fn get_string(&self, name: &str, default: &str) -> Result<String, PageError>;

    /// Start a new access session, bounding cache staleness.
    fn begin_session(&self);
}
