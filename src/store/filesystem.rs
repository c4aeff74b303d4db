//! Filesystem-backed content store

use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::PageError;
use crate::ident::{validate_page_name, PageIdent};
use crate::store::{ContentStore, MacroCache, Page, SubPage};

const DEFAULT_PRIORITY: i64 = 500;

/// Content store rooted at a database directory with the layout
/// `pages/<ident>/content.html`, `pages/<ident>/__macros/<name>`,
/// `macros/<name>` and `strings/<name>`.
pub struct FsStore {
    page_base: PathBuf,
    macro_base: PathBuf,
    string_base: PathBuf,
    cache: MacroCache,
}

/// Read a file as UTF-8. A missing file is an empty string; only a
/// decoding failure is escalated.
fn read_file(path: &Path) -> Result<String, PageError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            String::from_utf8(bytes).map_err(|_| PageError::internal("Unicode decode error"))
        }
        Err(_) => Ok(String::new()),
    }
}

fn read_int(path: &Path) -> Result<Option<i64>, PageError> {
    let content = read_file(path)?;
    Ok(content
        .trim()
        .parse()
        .ok())
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata()
        .is_ok()
}

/// Names of the sub-directories of `path`, omitting hidden entries and
/// "__" system folders.
fn subdir_list(path: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(path) else {
        return vec![];
    };
    let mut names = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = entry
            .file_name()
            .into_string()
        else {
            continue;
        };
        if name.starts_with('.') || name.starts_with("__") {
            continue;
        }
        if entry
            .file_type()
            .map(|t| t.is_dir())
            .unwrap_or(false)
        {
            names.push(name);
        }
    }
    names
}

impl FsStore {
    pub fn new(base: &Path) -> FsStore {
        FsStore {
            page_base: base.join("pages"),
            macro_base: base.join("macros"),
            string_base: base.join("strings"),
            cache: MacroCache::new(),
        }
    }

    fn page_dir(&self, ident: &PageIdent) -> PathBuf {
        self.page_base
            .join(ident.fs_path(0))
    }

    fn read_title(&self, dir: &Path) -> Result<String, PageError> {
        let title = read_file(&dir.join("title"))?;
        let title = title.trim();
        if title.is_empty() {
            let label = read_file(&dir.join("nav_label"))?;
            return Ok(label
                .trim()
                .to_string());
        }
        Ok(title.to_string())
    }

    /// Walk the scope chain looking for a macro body: the page directory
    /// itself, then each parent, then `pages/__macros`, then the site-wide
    /// macro directory.
    fn find_macro(&self, name: &str, scope: &PageIdent) -> Result<String, PageError> {
        for rstrip in 0..scope.len() {
            let path = self
                .page_base
                .join(scope.fs_path(rstrip))
                .join("__macros")
                .join(name);
            let body = read_file(&path)?;
            if !body.is_empty() {
                return Ok(body);
            }
        }
        let body = read_file(
            &self
                .page_base
                .join("__macros")
                .join(name),
        )?;
        if !body.is_empty() {
            return Ok(body);
        }
        read_file(&self.macro_base.join(name))
    }
}

impl ContentStore for FsStore {
    fn get_macro(&self, name: &str, scope: &PageIdent) -> Result<String, PageError> {
        validate_page_name(name, false)?;

        let scope_key = scope
            .fs_path(0)
            .to_string_lossy()
            .to_string();
        if let Some(body) = self
            .cache
            .get(&scope_key, name)
        {
            trace!("macro cache hit: {}", name);
            return Ok(body);
        }

        let body = self.find_macro(name, scope)?;

        // Remove empty lines from the macro body.
        let body = body
            .lines()
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        self.cache
            .put(&scope_key, name, &body);
        Ok(body)
    }

    fn get_page(&self, ident: &PageIdent) -> Result<Page, PageError> {
        let dir = self.page_dir(ident);
        let title = self.read_title(&dir)?;
        let content = read_file(&dir.join("content.html"))?;
        Ok(Page { title, content })
    }

    fn get_page_title(&self, ident: &PageIdent) -> Result<String, PageError> {
        let dir = self.page_dir(ident);
        self.read_title(&dir)
    }

    fn get_sub_pages(&self, ident: &PageIdent) -> Result<Vec<SubPage>, PageError> {
        let group_dir = self.page_dir(ident);
        let mut pages = Vec::new();
        for name in subdir_list(&group_dir) {
            let dir = group_dir.join(&name);
            if exists(&dir.join("hidden")) {
                continue;
            }
            if !read_file(&dir.join("redirect"))?
                .trim()
                .is_empty()
            {
                continue;
            }
            let nav_label = read_file(&dir.join("nav_label"))?
                .trim()
                .to_string();
            let priority = read_int(&dir.join("priority"))?.unwrap_or(DEFAULT_PRIORITY);
            pages.push(SubPage {
                name,
                nav_label,
                priority,
            });
        }
        pages.sort_by(|a, b| {
            (a.priority, &a.nav_label).cmp(&(b.priority, &b.nav_label))
        });
        Ok(pages)
    }

    fn get_string(&self, name: &str, default: &str) -> Result<String, PageError> {
        validate_page_name(name, false)?;
        let string = read_file(&self.string_base.join(name))?;
        let string = string.trim();
        if string.is_empty() {
            return Ok(default.to_string());
        }
        Ok(string.to_string())
    }

    fn begin_session(&self) {
        self.cache
            .clear();
    }
}
