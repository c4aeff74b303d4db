//! Built-in statement handlers: `$(name arg, ...)`
//!
//! Every handler parses its own arguments (which expands them eagerly,
//! left to right), validates the argument count, and produces a result.
//! All handlers are pure except `$(index)` and `$(anchor ...)`, which
//! record state for the post-expansion splice.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PageError;
use crate::ident::{validate_safe_path, PageIdent};
use crate::resolver::index::{Anchor, IndexRef};
use crate::resolver::Resolver;

macro_rules! regex {
    ($pattern:expr) => {{
        use std::sync::OnceLock;
        static REGEX: OnceLock<regex::Regex> = OnceLock::new();
        REGEX.get_or_init(|| regex::Regex::new($pattern).unwrap_or_else(|e| panic!("{}", e)))
    }};
}

const DEFAULT_MDATE_FORMAT: &str = "%d %B %Y %H:%M (UTC)";

/// Arithmetic results print as an integer when they are within 1e-6 of
/// their rounded value (and fit an i64), otherwise in fixed six-decimal
/// form. Pages depend on this exact formatting.
fn format_number(value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() >= 1e-6
        || rounded < i64::MIN as f64
        || rounded > i64::MAX as f64
    {
        format!("{value:.6}")
    } else {
        format!("{}", rounded as i64)
    }
}

type StatementResult = Result<(usize, String), PageError>;

impl Resolver<'_> {
    /// Dispatch a statement by name. Returns None for unknown names so the
    /// expander copies the text through unchanged.
    pub(crate) fn dispatch_statement(&mut self, name: &str, d: &str) -> Option<StatementResult> {
        let result = match name {
            // conditional / string compare / boolean
            "if" => self.stmt_if(d),
            "eq" => self.stmt_compare(d, false),
            "ne" => self.stmt_compare(d, true),
            "and" => self.stmt_and(d),
            "or" => self.stmt_or(d),
            "not" => self.stmt_not(d),

            // debugging
            "assert" => self.stmt_assert(d),

            // string processing
            "strip" => self.stmt_strip(d),
            "item" => self.stmt_item(d),
            "contains" => self.stmt_contains(d),
            "substr" => self.stmt_substr(d),
            "sanitize" => self.stmt_sanitize(d),

            // filesystem access
            "file_exists" => self.stmt_file_exists(d),
            "file_mdatet" => self.stmt_file_mdatet(d),

            // page index / page info
            "index" => self.stmt_index(d),
            "anchor" => self.stmt_anchor(d),
            "pagelist" => self.stmt_pagelist(d),

            // random numbers
            "random" => self.stmt_random(d),
            "randitem" => self.stmt_randitem(d),

            // arithmetic
            "add" => self.stmt_arith(d, "ADD", |a, b| a + b),
            "sub" => self.stmt_arith(d, "SUB", |a, b| a - b),
            "mul" => self.stmt_arith(d, "MUL", |a, b| a * b),
            "div" => self.stmt_arith(d, "DIV", |a, b| a / b),
            "mod" => self.stmt_arith(d, "MOD", |a, b| a % b),
            "round" => self.stmt_round(d),

            // external programs
            "whois" => self.stmt_whois(d),

            _ => return None,
        };
        Some(result)
    }

    /// $(if CONDITION, THEN)
    /// $(if CONDITION, THEN, ELSE)
    /// THEN if CONDITION is non-empty after trimming, ELSE otherwise.
    fn stmt_if(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 2 && args.len() != 3 {
            return Err(self.stmt_error(format!(
                "IF: invalid number of arguments ({})",
                args.len()
            )));
        }
        let result = if !args[0]
            .trim()
            .is_empty()
        {
            &args[1]
        } else if args.len() == 3 {
            &args[2]
        } else {
            ""
        };
        Ok((cons, result.to_string()))
    }

    /// $(eq A, B, ...) and $(ne A, B, ...)
    /// The last argument if all trimmed arguments are equal (eq) or not
    /// all equal (ne), an empty string otherwise.
    fn stmt_compare(&mut self, d: &str, invert: bool) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        let mut equal = args
            .iter()
            .all(|a| Some(a) == args.first());
        if invert {
            equal = !equal;
        }
        let result = if equal {
            args.last()
                .cloned()
                .unwrap_or_default()
        } else {
            String::new()
        };
        Ok((cons, result))
    }

    /// $(and A, B, ...)
    /// A if all trimmed arguments are non-empty, else an empty string.
    fn stmt_and(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        let result = if args
            .iter()
            .all(|a| !a.is_empty())
        {
            args.first()
                .cloned()
                .unwrap_or_default()
        } else {
            String::new()
        };
        Ok((cons, result))
    }

    /// $(or A, B, ...)
    /// The first trimmed non-empty argument, else an empty string.
    fn stmt_or(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        let result = args
            .into_iter()
            .find(|a| !a.is_empty())
            .unwrap_or_default();
        Ok((cons, result))
    }

    /// $(not A)
    /// "1" if A is empty after trimming, else an empty string.
    fn stmt_not(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        if args.len() != 1 {
            return Err(self.stmt_error("NOT: invalid args"));
        }
        let result = if args[0].is_empty() { "1" } else { "" };
        Ok((cons, result.to_string()))
    }

    /// $(assert A, ...)
    /// Fails the render if any argument is empty after trimming.
    fn stmt_assert(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        if args
            .iter()
            .any(|a| a.is_empty())
        {
            return Err(self.stmt_error("ASSERT: failed"));
        }
        Ok((cons, String::new()))
    }

    /// $(strip STRING, ...)
    /// All arguments trimmed and concatenated.
    fn stmt_strip(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        Ok((cons, args.concat()))
    }

    /// $(item STRING, N)
    /// $(item STRING, N, SEPARATOR)
    /// The N'th (0-based) token of STRING. SEPARATOR defaults to
    /// whitespace. Out of range is an empty string.
    fn stmt_item(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 2 && args.len() != 3 {
            return Err(self.stmt_error("ITEM: invalid args"));
        }
        let n: i64 = args[1]
            .trim()
            .parse()
            .map_err(|_| self.stmt_error("ITEM: N is not an integer"))?;
        let sep = args
            .get(2)
            .map(|s| s.trim())
            .unwrap_or("");
        let token = match usize::try_from(n) {
            Ok(n) if sep.is_empty() => args[0]
                .split_whitespace()
                .nth(n)
                .unwrap_or(""),
            Ok(n) => args[0]
                .split(sep)
                .nth(n)
                .unwrap_or(""),
            Err(_) => "",
        };
        Ok((cons, token.to_string()))
    }

    /// $(contains HAYSTACK, NEEDLE)
    /// $(contains HAYSTACK, NEEDLE, SEPARATOR)
    /// NEEDLE if it is a token of HAYSTACK, else an empty string.
    fn stmt_contains(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 2 && args.len() != 3 {
            return Err(self.stmt_error("CONTAINS: invalid args"));
        }
        let needle = args[1].trim();
        let sep = args
            .get(2)
            .map(|s| s.trim())
            .unwrap_or("");
        let found = if sep.is_empty() {
            args[0]
                .split_whitespace()
                .any(|token| token == needle)
        } else {
            args[0]
                .split(sep)
                .any(|token| token == needle)
        };
        let result = if found { needle } else { "" };
        Ok((cons, result.to_string()))
    }

    /// $(substr STRING, START)
    /// $(substr STRING, START, END)
    /// The single character at START, or the slice START..END. Indices
    /// are clamped; an empty result is not an error.
    fn stmt_substr(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 2 && args.len() != 3 {
            return Err(self.stmt_error("SUBSTR: invalid args"));
        }
        let chars: Vec<char> = args[0]
            .chars()
            .collect();
        let start: i64 = args[1]
            .trim()
            .parse()
            .map_err(|_| self.stmt_error("SUBSTR: START is not an integer"))?;
        let end_arg = args
            .get(2)
            .map(|s| s.trim())
            .unwrap_or("");
        let result = if end_arg.is_empty() {
            usize::try_from(start)
                .ok()
                .and_then(|start| chars.get(start))
                .map(|c| c.to_string())
                .unwrap_or_default()
        } else {
            let end: i64 = end_arg
                .parse()
                .map_err(|_| self.stmt_error("SUBSTR: END is not an integer"))?;
            // Negative indices fall out of range and yield nothing.
            let start = usize::try_from(start)
                .unwrap_or(usize::MAX)
                .min(chars.len());
            let end = usize::try_from(end)
                .unwrap_or(0)
                .min(chars.len());
            if start < end {
                chars[start..end]
                    .iter()
                    .collect()
            } else {
                String::new()
            }
        };
        Ok((cons, result))
    }

    /// $(sanitize STRING, ...)
    /// Arguments joined with underscores, lower-cased, every character
    /// outside [a-z0-9] replaced by an underscore, runs collapsed and
    /// leading/trailing underscores removed.
    fn stmt_sanitize(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        let joined = args
            .join("_")
            .to_lowercase();
        let replaced: String = joined
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let collapsed = regex!(r"_+").replace_all(&replaced, "_");
        Ok((
            cons,
            collapsed
                .trim_matches('_')
                .to_string(),
        ))
    }

    /// $(file_exists RELATIVE_PATH)
    /// $(file_exists RELATIVE_PATH, DOES_NOT_EXIST)
    /// The path if it exists under the static root, else the fallback.
    /// Unsafe paths never exist.
    fn stmt_file_exists(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 1 && args.len() != 2 {
            return Err(self.stmt_error("FILE_EXISTS: invalid args"));
        }
        let relpath = &args[0];
        let enoent = args
            .get(1)
            .map(String::as_str)
            .unwrap_or("");
        let exists = validate_safe_path(relpath)
            .map(|path| {
                self.config
                    .www_path
                    .join(path)
                    .exists()
            })
            .unwrap_or(false);
        let result = if exists { relpath } else { enoent };
        Ok((cons, result.to_string()))
    }

    /// $(file_mdatet RELATIVE_PATH)
    /// $(file_mdatet RELATIVE_PATH, DOES_NOT_EXIST, FORMAT_STRING)
    /// The file modification time formatted with a strftime string, or
    /// the fallback when the file is missing.
    fn stmt_file_mdatet(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.is_empty() || args.len() > 3 {
            return Err(self.stmt_error("FILE_MDATET: invalid args"));
        }
        let relpath = &args[0];
        let enoent = args
            .get(1)
            .map(String::as_str)
            .unwrap_or("");
        let format = args
            .get(2)
            .map(String::as_str)
            .unwrap_or(DEFAULT_MDATE_FORMAT)
            .trim();

        let modified = validate_safe_path(relpath)
            .ok()
            .and_then(|path| {
                std::fs::metadata(
                    self.config
                        .www_path
                        .join(path),
                )
                .and_then(|meta| meta.modified())
                .ok()
            });
        let Some(modified) = modified else {
            return Ok((cons, enoent.to_string()));
        };

        let stamp: DateTime<Utc> = modified.into();
        let mut formatted = String::new();
        if write!(formatted, "{}", stamp.format(format)).is_err() {
            return Err(self.stmt_error("FILE_MDATET: invalid format string"));
        }
        Ok((cons, formatted))
    }

    /// $(index)
    /// Records the current output offset for the deferred index splice.
    /// Emits nothing here.
    fn stmt_index(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 1
            || !args[0]
                .is_empty()
        {
            return Err(self.stmt_error("INDEX: invalid args"));
        }
        let char_offset = self.char_count;
        self.index_refs
            .push(IndexRef { char_offset });
        Ok((cons, String::new()))
    }

    /// $(anchor NAME, TEXT)
    /// $(anchor NAME, TEXT, INDENT_LEVEL)
    /// $(anchor NAME, TEXT, INDENT_LEVEL, NO_INDEX)
    /// Records an index anchor and emits its inline link immediately.
    fn stmt_anchor(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() < 2 || args.len() > 4 {
            return Err(self.stmt_error("ANCHOR: invalid args"));
        }
        let name = args[0].trim();
        let text = args[1].trim();
        let mut indent = -1;
        if let Some(raw) = args.get(2) {
            let raw = raw.trim();
            if !raw.is_empty() {
                indent = raw
                    .parse()
                    .map_err(|_| self.stmt_error("ANCHOR: indent level is not an integer"))?;
            }
        }
        let no_index = args
            .get(3)
            .map(|raw| {
                !raw.trim()
                    .is_empty()
            })
            .unwrap_or(false);

        let anchor = Anchor {
            name: name.to_string(),
            text: text.to_string(),
            indent,
            no_index,
        };
        let html = format!(
            "<a id=\"{}\" href=\"{}\">{}</a>",
            anchor.name,
            anchor.url(&self.page_url()),
            anchor.text
        );
        // Keep the anchor for index creation.
        self.anchors
            .push(anchor);
        Ok((cons, html))
    }

    /// $(pagelist BASEPAGE, ...)
    /// A <ul> navigation listing of the base page's sub-pages.
    fn stmt_pagelist(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        let base = PageIdent::new(
            args.iter()
                .map(|a| a.trim()),
        )
        .map_err(|_| self.stmt_error("PAGELIST: invalid base page name"))?;
        let sub_pages = self
            .store
            .get_sub_pages(&base)
            .map_err(|_| self.stmt_error("PAGELIST: invalid base page name"))?;

        let mut html = String::from("<ul>\n");
        for sub_page in sub_pages {
            let ident = base
                .child(&sub_page.name)
                .map_err(|_| self.stmt_error("PAGELIST: invalid base page name"))?;
            let title = self
                .store
                .get_page_title(&ident)?;
            let _ = write!(
                html,
                "\t<li><a href=\"{}\">{}</a></li>\n",
                ident.url(&self.config.url_base),
                title
            );
        }
        html.push_str("</ul>");
        Ok((cons, html))
    }

    /// $(random)
    /// $(random BEGIN)
    /// $(random BEGIN, END)
    /// A random integer in BEGIN..=END. BEGIN defaults to 0, END to 65535.
    fn stmt_random(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, true)?;
        if args.len() > 2 {
            return Err(self.stmt_error("RANDOM: invalid args"));
        }
        let begin = match args
            .first()
            .filter(|s| !s.is_empty())
        {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| self.stmt_error("RANDOM: invalid range"))?,
            None => 0,
        };
        let end = match args
            .get(1)
            .filter(|s| !s.is_empty())
        {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| self.stmt_error("RANDOM: invalid range"))?,
            None => 65535,
        };
        if begin > end {
            return Err(self.stmt_error("RANDOM: invalid range"));
        }
        let value: i64 = rand::thread_rng().gen_range(begin..=end);
        Ok((cons, value.to_string()))
    }

    /// $(randitem ITEM0, ITEM1, ...)
    /// One of the arguments, chosen uniformly at random.
    fn stmt_randitem(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        let Some(item) = args.choose(&mut rand::thread_rng()) else {
            return Err(self.stmt_error("RANDITEM: too few args"));
        };
        Ok((cons, item.clone()))
    }

    /// $(add A, B) and friends. Unparsable operands count as 0.0.
    fn stmt_arith<F>(&mut self, d: &str, name: &str, op: F) -> StatementResult
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 2 {
            return Err(self.stmt_error(format!("{name}: invalid args")));
        }
        let a: f64 = args[0]
            .trim()
            .parse()
            .unwrap_or(0.0);
        let b: f64 = args[1]
            .trim()
            .parse()
            .unwrap_or(0.0);
        let result = op(a, b);
        if !result.is_finite() {
            return Err(self.stmt_error(format!("{name}: arithmetic error")));
        }
        Ok((cons, format_number(result)))
    }

    /// $(round A)
    /// $(round A, NDIGITS)
    /// A rounded to NDIGITS decimal digits (default 0).
    fn stmt_round(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 1 && args.len() != 2 {
            return Err(self.stmt_error("ROUND: invalid args"));
        }
        let a: f64 = args[0]
            .trim()
            .parse()
            .unwrap_or(0.0);
        let digits = match args.get(1) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .unwrap_or(0)
                .clamp(0, 64) as usize,
            None => 0,
        };
        let result = if digits == 0 {
            let rounded = a
                .round()
                .clamp(i64::MIN as f64, i64::MAX as f64) as i64;
            rounded.to_string()
        } else {
            format!("{a:.digits$}")
        };
        Ok((cons, result))
    }

    /// $(whois DOMAIN)
    /// Runs the external whois lookup and returns its output. Optional;
    /// removing the dispatch arm removes the feature.
    fn stmt_whois(&mut self, d: &str) -> StatementResult {
        let (cons, args) = self.parse_args(d, false)?;
        if args.len() != 1 {
            return Err(self.stmt_error("WHOIS: invalid args"));
        }
        let domain = &args[0];
        if !domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(self.stmt_error("WHOIS: invalid domain"));
        }
        let output = std::process::Command::new("whois")
            .arg(domain)
            .output()
            .map_err(|_| self.stmt_error("WHOIS: execution error"))?;
        let text = String::from_utf8(output.stdout)
            .map_err(|_| self.stmt_error("WHOIS: unicode error"))?;
        Ok((cons, text))
    }
}
