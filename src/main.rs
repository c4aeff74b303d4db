use std::collections::HashMap;
use std::path::Path;
use std::process::ExitCode;

use clap::{Arg, ArgAction, ArgMatches, Command};

use pagemill::config::SiteConfig;
use pagemill::error::PageError;
use pagemill::ident::PageIdent;
use pagemill::resolver::vars::VarTable;
use pagemill::resolver::Resolver;
use pagemill::store::{ContentStore, FsStore};
use pagemill::templating;

fn main() -> ExitCode {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let matches = Command::new("pagemill")
        .version(VERSION)
        .propagate_version(true)
        .about("Statement and macro resolver for filesystem-backed page content.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("Path to the JSON site configuration file."),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Annotate statement errors with the macro name and line number where they occurred."),
        )
        .arg(
            Arg::new("define")
                .long("define")
                .short('D')
                .global(true)
                .action(ArgAction::Append)
                .value_name("NAME=VALUE")
                .help("Set an extra $NAME variable. May be given multiple times."),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .short('q')
                .global(true)
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .help("Set a request query parameter, available to content as $Q_KEY."),
        )
        .subcommand(
            Command::new("render")
                .about("Resolve a page from the content store and print the finished HTML document")
                .arg(
                    Arg::new("page")
                        .required(true)
                        .help("The page path to render, for example 'about/contact'."),
                ),
        )
        .subcommand(
            Command::new("expand")
                .about("Expand a raw content file without a page context")
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The file containing the content you want to expand."),
                ),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(&matches) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("pagemill: {}", error);
            return ExitCode::FAILURE;
        }
    };

    match matches.subcommand() {
        Some(("render", submatches)) => match run_render(&config, &matches, submatches) {
            Ok(html) => {
                print!("{}", html);
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("pagemill: {}", error);
                match render_error_page(&config, &matches, &error) {
                    Ok(html) => print!("{}", html),
                    Err(second) => eprintln!("pagemill: error page failed: {}", second),
                }
                ExitCode::FAILURE
            }
        },
        Some(("expand", submatches)) => match run_expand(&config, &matches, submatches) {
            Ok(output) => {
                print!("{}", output);
                ExitCode::SUCCESS
            }
            Err(error) => {
                eprintln!("pagemill: {}", error);
                ExitCode::FAILURE
            }
        },
        _ => {
            println!("usage: pagemill [COMMAND] ...");
            println!("Try '--help' for more information.");
            ExitCode::FAILURE
        }
    }
}

fn load_config(matches: &ArgMatches) -> Result<SiteConfig, PageError> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => SiteConfig::load(Path::new(path))?,
        None => SiteConfig::default(),
    };
    if matches.get_flag("debug") {
        config.debug = true;
    }
    Ok(config)
}

/// "NAME=VALUE" into its two halves. A bare "NAME" sets an empty value.
fn split_assignment(assignment: &str) -> (&str, &str) {
    assignment
        .split_once('=')
        .unwrap_or((assignment, ""))
}

/// The variable table every render starts from: the site identity
/// variables, any --define overrides, and the $Q_* query echoes.
fn base_vars(config: &SiteConfig, matches: &ArgMatches) -> VarTable {
    let mut vars = VarTable::new(config.debug);
    vars.set("DOMAIN", config.domain.clone());
    vars.set("CMS_BASE", config.url_base.clone());
    vars.set("IMAGES_DIR", format!("{}/__images", config.url_base));
    vars.set("THUMBS_DIR", format!("{}/__thumbs", config.url_base));
    vars.set("DEBUG", if config.debug { "1" } else { "" });

    for assignment in matches
        .get_many::<String>("define")
        .unwrap_or_default()
    {
        let (name, value) = split_assignment(assignment);
        vars.set(name, value);
    }

    let mut queries: HashMap<String, String> = HashMap::new();
    for assignment in matches
        .get_many::<String>("query")
        .unwrap_or_default()
    {
        let (key, value) = split_assignment(assignment);
        queries.insert(key.to_uppercase(), value.to_string());
    }
    if !queries.is_empty() {
        vars.set_prefix("Q", move |name| {
            queries
                .get(&name["Q_".len()..])
                .cloned()
                .unwrap_or_default()
        });
    }
    vars
}

fn run_render(
    config: &SiteConfig,
    matches: &ArgMatches,
    submatches: &ArgMatches,
) -> Result<String, PageError> {
    let store = FsStore::new(&config.db_path);
    store.begin_session();

    let raw_path = submatches
        .get_one::<String>("page")
        .map(String::as_str)
        .unwrap_or("");
    let ident = PageIdent::parse(raw_path)?;
    let page = store.get_page(&ident)?;
    if page
        .content
        .is_empty()
    {
        return Err(PageError::not_found("Page not found"));
    }

    let mut vars = base_vars(config, matches);
    vars.set(
        "GROUP",
        ident
            .elements()
            .first()
            .cloned()
            .unwrap_or_default(),
    );
    vars.set(
        "PAGE",
        ident
            .elements()
            .get(1)
            .cloned()
            .unwrap_or_default(),
    );

    // The title resolves first so content can reference $TITLE.
    let title = Resolver::new(&store, config, &vars, &ident).resolve(&page.title)?;
    vars.set("TITLE", title.clone());
    let body = Resolver::new(&store, config, &vars, &ident).resolve(&page.content)?;
    let home_label = home_label(&store, config, &vars, &ident)?;

    templating::render_page(
        &title,
        &body,
        &PageIdent::root().url(&config.url_base),
        &home_label,
    )
}

/// The home link label for the page shell, from the string table and
/// resolved like any other content.
fn home_label(
    store: &dyn ContentStore,
    config: &SiteConfig,
    vars: &VarTable,
    ident: &PageIdent,
) -> Result<String, PageError> {
    let raw = store.get_string("home", "Home")?;
    Resolver::new(store, config, vars, ident).resolve(&raw)
}

/// The built-in error page runs through the resolver with a root page
/// identity, so a broken page can never break error reporting.
fn render_error_page(
    config: &SiteConfig,
    matches: &ArgMatches,
    error: &PageError,
) -> Result<String, PageError> {
    let store = FsStore::new(&config.db_path);
    store.begin_session();
    let ident = PageIdent::root();

    let mut vars = base_vars(config, matches);
    vars.set("GROUP", "_nogroup_");
    vars.set("PAGE", "_nopage_");
    vars.set("HTTP_STATUS", error.to_string());
    vars.set("HTTP_STATUS_CODE", error.status.to_string());
    vars.set("ERROR_MESSAGE", error.message.clone());

    let body = Resolver::new(&store, config, &vars, &ident).resolve(templating::ERROR_DOCUMENT)?;
    let home_label = home_label(&store, config, &vars, &ident)?;
    templating::render_page(
        "Error",
        &body,
        &PageIdent::root().url(&config.url_base),
        &home_label,
    )
}

fn run_expand(
    config: &SiteConfig,
    matches: &ArgMatches,
    submatches: &ArgMatches,
) -> Result<String, PageError> {
    let filename = submatches
        .get_one::<String>("filename")
        .map(String::as_str)
        .unwrap_or("");
    let content = std::fs::read_to_string(filename)
        .map_err(|error| PageError::internal(format!("{}: {}", filename, error)))?;

    let store = FsStore::new(&config.db_path);
    store.begin_session();
    let ident = PageIdent::root();
    let vars = base_vars(config, matches);

    Resolver::new(&store, config, &vars, &ident).resolve(&content)
}
