#[cfg(test)]
mod verify {
    use std::fs;
    use std::path::Path;

    use pagemill::ident::PageIdent;
    use pagemill::store::{ContentStore, FsStore};

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn macro_scope_preference() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write(&base.join("pages/about/__macros/widget"), "group scope");
        write(&base.join("pages/__macros/widget"), "top scope");
        write(&base.join("macros/widget"), "site scope");
        write(&base.join("macros/global"), "site scope only");

        let store = FsStore::new(base);
        let team = PageIdent::parse("about/team").unwrap();
        let other = PageIdent::parse("other").unwrap();

        // The nearest enclosing scope wins.
        assert_eq!(store.get_macro("widget", &team).unwrap(), "group scope");
        assert_eq!(store.get_macro("widget", &other).unwrap(), "top scope");
        assert_eq!(
            store.get_macro("global", &team).unwrap(),
            "site scope only"
        );

        // A page-local override beats everything.
        store.begin_session();
        write(&base.join("pages/about/team/__macros/widget"), "page scope");
        assert_eq!(store.get_macro("widget", &team).unwrap(), "page scope");
    }

    #[test]
    fn macro_bodies_lose_empty_lines() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("macros/m"), "a\n\nb\n");

        let store = FsStore::new(dir.path());
        let root = PageIdent::root();
        assert_eq!(store.get_macro("m", &root).unwrap(), "a\nb");
    }

    #[test]
    fn macros_are_cached_per_session() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("macros/m"), "old");

        let store = FsStore::new(dir.path());
        let root = PageIdent::root();
        assert_eq!(store.get_macro("m", &root).unwrap(), "old");

        write(&dir.path().join("macros/m"), "new");
        assert_eq!(store.get_macro("m", &root).unwrap(), "old");

        store.begin_session();
        assert_eq!(store.get_macro("m", &root).unwrap(), "new");
    }

    #[test]
    fn system_macro_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let root = PageIdent::root();

        assert_eq!(
            store
                .get_macro("__hidden", &root)
                .unwrap_err()
                .status,
            404
        );
        assert_eq!(
            store
                .get_macro("../escape", &root)
                .unwrap_err()
                .status,
            404
        );
    }

    #[test]
    fn page_titles_fall_back_to_nav_labels() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write(&base.join("pages/a/title"), "Title A\n");
        write(&base.join("pages/a/content.html"), "<p>A</p>");
        write(&base.join("pages/b/nav_label"), "Label B\n");

        let store = FsStore::new(base);
        let a = PageIdent::parse("a").unwrap();
        let b = PageIdent::parse("b").unwrap();

        let page = store.get_page(&a).unwrap();
        assert_eq!(page.title, "Title A");
        assert_eq!(page.content, "<p>A</p>");
        assert_eq!(store.get_page_title(&b).unwrap(), "Label B");

        // A page that does not exist is simply empty.
        let missing = PageIdent::parse("nope").unwrap();
        let page = store.get_page(&missing).unwrap();
        assert_eq!(page.title, "");
        assert_eq!(page.content, "");
    }

    #[test]
    fn sub_page_listing_and_ordering() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        write(&base.join("pages/g/zz/nav_label"), "First\n");
        write(&base.join("pages/g/zz/priority"), "100\n");
        write(&base.join("pages/g/aa/nav_label"), "Second\n");
        write(&base.join("pages/g/hid/nav_label"), "Hidden\n");
        write(&base.join("pages/g/hid/hidden"), "");
        write(&base.join("pages/g/moved/nav_label"), "Moved\n");
        write(&base.join("pages/g/moved/redirect"), "elsewhere\n");
        write(&base.join("pages/g/__macros/x"), "not a page");

        let store = FsStore::new(base);
        let group = PageIdent::parse("g").unwrap();

        let subs = store
            .get_sub_pages(&group)
            .unwrap();
        let summary: Vec<(&str, &str, i64)> = subs
            .iter()
            .map(|s| (s.name.as_str(), s.nav_label.as_str(), s.priority))
            .collect();
        // Sorted by priority, then label. Hidden and redirecting pages and
        // system folders stay out.
        assert_eq!(
            summary,
            [("zz", "First", 100), ("aa", "Second", 500)]
        );
    }

    #[test]
    fn named_strings_have_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("strings/greeting"), "hello\n");

        let store = FsStore::new(dir.path());
        assert_eq!(store.get_string("greeting", "hi").unwrap(), "hello");
        assert_eq!(store.get_string("missing", "hi").unwrap(), "hi");
    }
}
