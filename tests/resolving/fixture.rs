//! An in-memory content store and a pre-wired resolver for the tests.

use std::collections::HashMap;

use pagemill::config::SiteConfig;
use pagemill::error::PageError;
use pagemill::ident::{validate_page_name, PageIdent};
use pagemill::resolver::vars::VarTable;
use pagemill::resolver::Resolver;
use pagemill::store::{ContentStore, Page, SubPage};

fn key(ident: &PageIdent) -> String {
    ident
        .fs_path(0)
        .to_string_lossy()
        .to_string()
}

#[derive(Default)]
pub struct MemStore {
    pub macros: HashMap<String, String>,
    pub pages: HashMap<String, Page>,
    pub sub_pages: HashMap<String, Vec<SubPage>>,
    pub strings: HashMap<String, String>,
}

impl ContentStore for MemStore {
    fn get_macro(&self, name: &str, _scope: &PageIdent) -> Result<String, PageError> {
        validate_page_name(name, false)?;
        Ok(self
            .macros
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    fn get_page(&self, ident: &PageIdent) -> Result<Page, PageError> {
        Ok(self
            .pages
            .get(&key(ident))
            .cloned()
            .unwrap_or(Page {
                title: String::new(),
                content: String::new(),
            }))
    }

    fn get_page_title(&self, ident: &PageIdent) -> Result<String, PageError> {
        Ok(self
            .get_page(ident)?
            .title)
    }

    fn get_sub_pages(&self, ident: &PageIdent) -> Result<Vec<SubPage>, PageError> {
        Ok(self
            .sub_pages
            .get(&key(ident))
            .cloned()
            .unwrap_or_default())
    }

    fn get_string(&self, name: &str, default: &str) -> Result<String, PageError> {
        Ok(self
            .strings
            .get(name)
            .cloned()
            .unwrap_or_else(|| default.to_string()))
    }

    fn begin_session(&self) {}
}

/// Everything a resolver needs, with room to poke at the pieces before
/// calling resolve().
pub struct Fixture {
    pub store: MemStore,
    pub config: SiteConfig,
    pub vars: VarTable,
    pub page: PageIdent,
}

impl Fixture {
    pub fn new() -> Fixture {
        Fixture {
            store: MemStore::default(),
            config: SiteConfig::default(),
            vars: VarTable::new(false),
            page: PageIdent::root(),
        }
    }

    pub fn debug(mut self) -> Fixture {
        self.config.debug = true;
        self
    }

    pub fn with_macro(mut self, name: &str, body: &str) -> Fixture {
        self.store
            .macros
            .insert(name.to_string(), body.to_string());
        self
    }

    pub fn resolve(&self, content: &str) -> Result<String, PageError> {
        Resolver::new(&self.store, &self.config, &self.vars, &self.page).resolve(content)
    }

    /// Resolve content that must succeed.
    pub fn expand(&self, content: &str) -> String {
        match self.resolve(content) {
            Ok(output) => output,
            Err(error) => panic!("resolving {:?} failed: {}", content, error),
        }
    }

    /// Resolve content that must fail, returning the error.
    pub fn expand_err(&self, content: &str) -> PageError {
        match self.resolve(content) {
            Ok(output) => panic!("resolving {:?} unexpectedly produced {:?}", content, output),
            Err(error) => error,
        }
    }
}
