//! pagemill is a small content management system renderer. Pages are
//! otherwise static HTML with an embedded mini-language: `@macro(...)`
//! calls, `$(statement ...)` built-ins, `$VARIABLE` substitutions, and a
//! deferred page-index mechanism. The resolver module does the heavy
//! lifting; the store and ident modules supply the content it resolves
//! against.

pub mod config;
pub mod error;
pub mod ident;
pub mod resolver;
pub mod store;
pub mod templating;
