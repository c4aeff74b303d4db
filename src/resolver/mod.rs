//! The statement and macro resolver
//!
//! Page content is scanned left to right in a single pass. Escapes are
//! carried through structurally intact, comments are stripped, `@name(...)`
//! macro calls and `$(name ...)` statements are expanded recursively, and
//! `$VARIABLE` references are substituted. After expansion any recorded
//! `$(index)` placeholders are spliced with a nested list built from the
//! anchors seen along the way, and a final pass removes the escapes.

mod expand;
mod index;
mod invoke;
mod scan;
mod statements;
pub mod vars;

use tracing::debug;

use crate::config::SiteConfig;
use crate::error::PageError;
use crate::ident::PageIdent;
use crate::resolver::index::{Anchor, IndexRef};
use crate::resolver::vars::VarTable;
use crate::store::ContentStore;

/// Characters that may be escaped with a backslash to suppress their
/// structural meaning. The backslash stays in place all the way through
/// expansion and is removed only in the final unescape pass.
pub const ESCAPE_CHARS: &str = "\\,@$()";

pub(crate) const VARNAME_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ_";
pub(crate) const DIGIT_CHARS: &str = "0123456789";

/// Macro calls may nest this deep. The check runs at macro entry against a
/// stack that already holds the root frame, so exactly this many nested
/// invocations succeed and one more fails the render.
pub const MACRO_STACK_DEPTH_MAX: usize = 64;

/// Escape all structural characters in `text`.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if ESCAPE_CHARS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Remove the escape prefixes from `text`. Only a backslash followed by an
/// escapable character is an escape; any other backslash passes through.
pub fn unescape(text: &str) -> String {
    let mut unescaped = String::with_capacity(text.len());
    let mut chars = text
        .chars()
        .peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if ESCAPE_CHARS.contains(next) {
                    unescaped.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        unescaped.push(c);
    }
    unescaped
}

/// One macro invocation on the diagnostic call stack. The line number
/// advances on every newline observed while scanning the frame's body and
/// is only used for error messages. Call arguments live on the frame so
/// that `$N` references are scoped strictly to the active invocation.
#[derive(Debug)]
pub(crate) struct Frame {
    name: String,
    lineno: u32,
    args: Vec<String>,
}

impl Frame {
    fn new(name: &str, args: Vec<String>) -> Frame {
        Frame {
            name: name.to_string(),
            lineno: 1,
            args,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bump_lineno(&mut self) {
        self.lineno += 1;
    }

    /// The nth (0-based) call-site argument, or "" when out of range.
    pub(crate) fn arg(&self, index: usize) -> &str {
        self.args
            .get(index)
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug)]
pub(crate) struct CallStack {
    frames: Vec<Frame>,
}

impl CallStack {
    fn new() -> CallStack {
        CallStack {
            frames: vec![Frame::new("content.html", vec![])],
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames
            .len()
    }

    pub(crate) fn push(&mut self, frame: Frame) {
        self.frames
            .push(frame);
    }

    pub(crate) fn pop(&mut self) {
        // The root frame stays.
        if self
            .frames
            .len()
            > 1
        {
            self.frames
                .pop();
        }
    }

    pub(crate) fn top(&self) -> &Frame {
        self.frames
            .last()
            .expect("call stack holds at least the root frame")
    }

    pub(crate) fn top_mut(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .expect("call stack holds at least the root frame")
    }
}

/// Per-render resolver state. Create one per page render; `resolve` resets
/// all transient state at entry, so an instance can be reused serially but
/// never shared across concurrent renders.
pub struct Resolver<'a> {
    store: &'a dyn ContentStore,
    config: &'a SiteConfig,
    vars: &'a VarTable,
    page: &'a PageIdent,
    stack: CallStack,
    char_count: usize,
    index_refs: Vec<IndexRef>,
    anchors: Vec<Anchor>,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn ContentStore,
        config: &'a SiteConfig,
        vars: &'a VarTable,
        page: &'a PageIdent,
    ) -> Resolver<'a> {
        Resolver {
            store,
            config,
            vars,
            page,
            stack: CallStack::new(),
            char_count: 0,
            index_refs: vec![],
            anchors: vec![],
        }
    }

    /// Expand `content` fully: one expansion pass, then index splicing,
    /// then unescaping. Empty content is returned unchanged without
    /// invoking the expander.
    pub fn resolve(&mut self, content: &str) -> Result<String, PageError> {
        if content.is_empty() {
            return Ok(String::new());
        }
        self.reset();
        debug!("resolving {} bytes", content.len());

        let (_, expanded) = self.expand(content, "")?;
        let spliced = self.splice_indices(expanded)?;
        Ok(unescape(&spliced))
    }

    fn reset(&mut self) {
        self.stack = CallStack::new();
        self.char_count = 0;
        self.index_refs
            .clear();
        self.anchors
            .clear();
    }

    /// A 500-class statement failure. In debug mode the message carries a
    /// "name:line: " prefix taken from the top call-stack frame.
    pub(crate) fn stmt_error(&self, message: impl AsRef<str>) -> PageError {
        let message = message.as_ref();
        if self
            .config
            .debug
        {
            let top = self
                .stack
                .top();
            PageError::internal(format!("{}:{}: {}", top.name, top.lineno, message))
        } else {
            PageError::internal(message)
        }
    }

    pub(crate) fn expand_variable(&self, name: &str) -> String {
        self.vars
            .get(name)
    }

    pub(crate) fn page_url(&self) -> String {
        self.page
            .url(&self.config.url_base)
    }
}
