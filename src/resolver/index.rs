//! Page index generation and deferred splicing
//!
//! `$(index)` cannot be rendered inline because anchors later in the page
//! still contribute entries. Expansion therefore records each index site
//! as a byte offset into the expanded output and the finished lists are
//! inserted afterwards, before the final unescape pass.

use std::fmt::Write as _;

use crate::error::PageError;
use crate::resolver::Resolver;

/// Nesting levels beyond this trip an error rather than emit a page-sized
/// wall of <ul> tags.
const INDEX_INDENT_MAX: i64 = 1024;

/// One recorded `$(index)` site: the byte offset in the expanded, not yet
/// spliced output where the index list belongs.
#[derive(Clone, Copy, Debug)]
pub(crate) struct IndexRef {
    pub(crate) char_offset: usize,
}

/// One `$(anchor ...)` occurrence. An indent of -1 inherits the level of
/// the preceding anchor.
#[derive(Clone, Debug)]
pub(crate) struct Anchor {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) indent: i64,
    pub(crate) no_index: bool,
}

impl Anchor {
    pub(crate) fn url(&self, page_url: &str) -> String {
        format!("{}#{}", page_url, self.name)
    }
}

fn push_tabs(out: &mut String, count: i64) {
    for _ in 0..count {
        out.push('\t');
    }
}

impl Resolver<'_> {
    /// Build one nested <ul> index from all recorded anchors. Every
    /// recorded `$(index)` receives an identical copy.
    fn build_index(&self) -> Result<String, PageError> {
        let page_url = self.page_url();
        let mut html = String::from("\t<ul>\n");
        let mut indent: i64 = 0;

        for anchor in &self.anchors {
            if anchor.no_index
                || anchor
                    .text
                    .is_empty()
            {
                continue;
            }
            if anchor.indent > INDEX_INDENT_MAX {
                return Err(PageError::internal("Anchor indent too big"));
            }

            // Open or close levels until we are at the anchor's indent.
            // -1 keeps the current level.
            if anchor.indent >= 0 {
                while indent < anchor.indent {
                    indent += 1;
                    push_tabs(&mut html, indent + 1);
                    html.push_str("<ul>\n");
                }
                while indent > anchor.indent {
                    push_tabs(&mut html, indent + 1);
                    html.push_str("</ul>\n");
                    indent -= 1;
                }
            }

            push_tabs(&mut html, indent + 1);
            let _ = write!(
                html,
                "<li><a href=\"{}\">{}</a></li>\n",
                anchor.url(&page_url),
                anchor.text
            );
        }

        while indent >= 0 {
            push_tabs(&mut html, indent + 1);
            html.push_str("</ul>\n");
            indent -= 1;
        }
        Ok(html)
    }

    /// Insert the generated index at every recorded `$(index)` site. The
    /// recorded offsets refer to the un-spliced stream, so each insertion
    /// shifts the remaining ones by the inserted length. An `$(index)`
    /// inside a discarded statement argument records an offset against
    /// text that never reached the output, so the position is clamped to
    /// the data and snapped back onto a character boundary.
    pub(crate) fn splice_indices(&self, mut data: String) -> Result<String, PageError> {
        if self
            .index_refs
            .is_empty()
        {
            return Ok(data);
        }
        let block = self.build_index()?;
        let mut inserted = 0;
        for index_ref in &self.index_refs {
            let mut at = (inserted + index_ref.char_offset).min(data.len());
            while !data.is_char_boundary(at) {
                at -= 1;
            }
            data.insert_str(at, &block);
            inserted += block.len();
        }
        Ok(data)
    }
}
