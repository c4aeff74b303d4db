//! HTML page shell around resolved content

use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::error::PageError;

static PAGE_SHELL: &'static str = r#"<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="en" xml:lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="generator" content="pagemill" />
    <title>{title}</title>
</head>
<body>
<div class="nav"><a href="{home_url}">{home_label}</a></div>
<h1>{title}</h1>
{body}
</body>
</html>
"#;

/// The page rendered when resolution fails. It goes through the resolver
/// itself with a root page identity, so it must not rely on any real page
/// existing.
pub static ERROR_DOCUMENT: &str = "\
<p>An error occurred while generating this page:</p>
<p><b>$HTTP_STATUS</b></p>
$(if $DEBUG, <pre>$ERROR_MESSAGE</pre>, <p>Enable debug mode for details.</p>)
";

#[derive(Serialize)]
struct Context {
    title: String,
    body: String,
    home_url: String,
    home_label: String,
}

/// Wrap a resolved title and body in the HTML5 shell. Everything is
/// author markup and is inserted verbatim. The home link label comes
/// from the string table ("home", default "Home").
pub fn render_page(
    title: &str,
    body: &str,
    home_url: &str,
    home_label: &str,
) -> Result<String, PageError> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("page", PAGE_SHELL)
        .map_err(|e| PageError::internal(format!("Page template: {e}")))?;

    let context = Context {
        title: title.to_string(),
        body: body.to_string(),
        home_url: home_url.to_string(),
        home_label: home_label.to_string(),
    };
    tt.render("page", &context)
        .map_err(|e| PageError::internal(format!("Page template: {e}")))
}
