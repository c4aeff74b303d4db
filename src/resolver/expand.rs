//! The expansion driver: a single left-to-right scan

use crate::error::PageError;
use crate::resolver::scan::{char_at, find_any, find_not};
use crate::resolver::{Resolver, DIGIT_CHARS, ESCAPE_CHARS, VARNAME_CHARS};

impl Resolver<'_> {
    /// Expand `d` until a stop character is consumed or input runs out.
    /// An empty `stop_chars` scans to the end; otherwise reaching the end
    /// without a stop match is an unterminated statement and fails the
    /// render. Returns the number of input bytes consumed (including the
    /// stop character) and the expanded output.
    ///
    /// The running character counter tracks the byte offset in the final
    /// output so that `$(index)` can record where to splice later. Every
    /// append bumps it and the total is handed back to the caller at
    /// return, so recursive sub-expansions contribute net growth exactly
    /// once.
    pub(crate) fn expand(&mut self, d: &str, stop_chars: &str) -> Result<(usize, String), PageError> {
        let mut out = String::with_capacity(d.len());
        let mut i = 0;
        let mut stopped = false;

        while i < d.len() {
            let Some(c) = char_at(d, i) else { break };

            if c == '\\' {
                // Escaped character. Keep the escape; it is removed in the
                // final unescape pass.
                if let Some(next) = char_at(d, i + 1) {
                    if ESCAPE_CHARS.contains(next) {
                        out.push('\\');
                        out.push(next);
                        self.char_count += 1 + next.len_utf8();
                        i += 1 + next.len_utf8();
                        continue;
                    }
                }
            } else if c == '\n' {
                self.stack
                    .top_mut()
                    .bump_lineno();
            } else if d[i..].starts_with("<!---") {
                // Comment
                if let Some(found) = d[i + 1..].find("--->") {
                    let close_end = i + 1 + found + 4;
                    let mut cons = close_end - i;
                    // If the comment is on a line of its own, remove the
                    // whole line.
                    let own_line = i == 0 || d[..i].ends_with('\n');
                    if own_line && d[close_end..].starts_with('\n') {
                        cons += 1;
                    }
                    i += cons;
                    continue;
                }
            } else if !stop_chars.is_empty() && stop_chars.contains(c) {
                // Stop character: consume it and hand control back to the
                // argument parser.
                i += c.len_utf8();
                stopped = true;
                break;
            } else if c == '@' {
                // Macro call
                if let Some(found) = d[i + 1..].find('(') {
                    let end = i + 1 + found;
                    let name = &d[i + 1..end];
                    let (cons, body) = self.invoke_macro(name, &d[end + 1..])?;
                    self.char_count += body.len();
                    out.push_str(&body);
                    i = end + 1 + cons;
                    continue;
                }
            } else if d[i..].starts_with("$(") {
                // Statement
                if let Some(end) = find_any(d, " )", i + 2) {
                    let name = &d[i + 2..end];
                    let rest = if d.as_bytes()[end] == b' ' { end + 1 } else { end };
                    if let Some(result) = self.dispatch_statement(name, &d[rest..]) {
                        let (cons, output) = result?;
                        self.char_count += output.len();
                        out.push_str(&output);
                        i = rest + cons;
                        continue;
                    }
                    // Unknown statements are not errors; fall through to
                    // the literal copy.
                }
            } else if c == '$'
                && self
                    .stack
                    .depth()
                    > 1
                && char_at(d, i + 1)
                    .map(|n| n.is_ascii_digit())
                    .unwrap_or(false)
            {
                // Macro argument reference, scoped to the active frame.
                // $0 is the macro's own name.
                let end = find_not(d, DIGIT_CHARS, i + 1).unwrap_or(d.len());
                let number = d[i + 1..end]
                    .parse::<usize>()
                    .unwrap_or(usize::MAX);
                let top = self
                    .stack
                    .top();
                let value = if number == 0 {
                    top.name()
                        .to_string()
                } else {
                    top.arg(number - 1)
                        .to_string()
                };
                self.char_count += value.len();
                out.push_str(&value);
                i = end;
                continue;
            } else if c == '$' {
                // Variable reference. Unknown names expand to nothing.
                let end = find_not(d, VARNAME_CHARS, i + 1).unwrap_or(d.len());
                if end > i + 1 {
                    let value = self.expand_variable(&d[i + 1..end]);
                    self.char_count += value.len();
                    out.push_str(&value);
                    i = end;
                    continue;
                }
            }

            // Default: literal passthrough.
            out.push(c);
            self.char_count += c.len_utf8();
            i += c.len_utf8();
        }

        if !stop_chars.is_empty() && !stopped {
            return Err(self.stmt_error("Unterminated statement"));
        }

        // Hand the growth accounting back to the caller: whoever appends
        // this output bumps the counter again.
        self.char_count -= out.len();
        Ok((i, out))
    }

    /// Split a statement's argument list by repeatedly expanding with the
    /// stop-set `,)` until the closing parenthesis is consumed. Nesting
    /// works because inner statements and macros are resolved before their
    /// delimiters are ever seen here.
    pub(crate) fn parse_args(
        &mut self,
        d: &str,
        strip: bool,
    ) -> Result<(usize, Vec<String>), PageError> {
        let mut cons = 0;
        let mut args = Vec::new();
        while cons < d.len() {
            let (c, data) = self.expand(&d[cons..], ",)")?;
            cons += c;
            args.push(if strip {
                data.trim()
                    .to_string()
            } else {
                data
            });
            if c == 0 || d.as_bytes()[cons - 1] == b')' {
                break;
            }
        }
        Ok((cons, args))
    }
}
