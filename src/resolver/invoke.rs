//! Macro invocation: `@name(arg, ...)` sites

use tracing::trace;

use crate::error::PageError;
use crate::resolver::{Frame, Resolver, MACRO_STACK_DEPTH_MAX};

impl Resolver<'_> {
    /// Expand a macro call site. The arguments are parsed (trimmed) from
    /// `d`, the body is fetched from the content store preferring
    /// page-scoped overrides, and the body is expanded under a fresh
    /// call-stack frame so `$N` references resolve against this call only.
    /// A missing or empty macro expands to nothing.
    pub(crate) fn invoke_macro(&mut self, name: &str, d: &str) -> Result<(usize, String), PageError> {
        if self
            .stack
            .depth()
            > MACRO_STACK_DEPTH_MAX
        {
            return Err(PageError::internal("Exceeded macro call stack depth"));
        }

        let (cons, args) = self.parse_args(d, true)?;

        let body = match self
            .store
            .get_macro(name, self.page)
        {
            Ok(body) => body,
            Err(error) if error.status == 404 => {
                return Err(self.stmt_error(format!(
                    "Macro name '{name}' contains invalid characters"
                )));
            }
            Err(error) => return Err(error),
        };
        if body.is_empty() {
            // Macro does not exist.
            return Ok((cons, String::new()));
        }

        trace!("expanding macro {} ({} args)", name, args.len());
        self.stack
            .push(Frame::new(name, args));
        let result = self.expand(&body, "");
        self.stack
            .pop();

        let (_, output) = result?;
        Ok((cons, output))
    }
}
