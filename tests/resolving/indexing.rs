#[cfg(test)]
mod verify {
    use crate::fixture::Fixture;

    #[test]
    fn anchors_emit_inline_links() {
        let f = Fixture::new();
        assert_eq!(
            f.expand("$(anchor intro, Introduction)"),
            "<a id=\"intro\" href=\"/cms#intro\">Introduction</a>"
        );
    }

    #[test]
    fn anchor_argument_validation() {
        let f = Fixture::new();
        let error = f.expand_err("$(anchor one)");
        assert_eq!(error.message, "ANCHOR: invalid args");
        let error = f.expand_err("$(anchor one, One, x)");
        assert_eq!(error.message, "ANCHOR: indent level is not an integer");
    }

    #[test]
    fn index_argument_validation() {
        let f = Fixture::new();
        let error = f.expand_err("$(index x)");
        assert_eq!(error.message, "INDEX: invalid args");
    }

    #[test]
    fn index_lists_anchors_with_nesting() {
        // Anchors: inherited indent, one level deeper, back to the top.
        let f = Fixture::new();
        let output = f.expand(
            "XY$(index)Z$(anchor a, A)$(anchor b, B, 1)$(anchor c, C, 0)",
        );

        let index = "\t<ul>\n\
                     \t<li><a href=\"/cms#a\">A</a></li>\n\
                     \t\t<ul>\n\
                     \t\t<li><a href=\"/cms#b\">B</a></li>\n\
                     \t\t</ul>\n\
                     \t<li><a href=\"/cms#c\">C</a></li>\n\
                     \t</ul>\n";
        let expected = format!(
            "XY{}Z\
             <a id=\"a\" href=\"/cms#a\">A</a>\
             <a id=\"b\" href=\"/cms#b\">B</a>\
             <a id=\"c\" href=\"/cms#c\">C</a>",
            index
        );
        assert_eq!(output, expected);
    }

    #[test]
    fn no_index_anchors_are_left_out() {
        let f = Fixture::new();
        let output = f.expand("$(index)$(anchor a, A,, 1)$(anchor b, B)");

        assert!(output.starts_with(
            "\t<ul>\n\
             \t<li><a href=\"/cms#b\">B</a></li>\n\
             \t</ul>\n"
        ));
        // The inline link is still emitted.
        assert!(output.contains("<a id=\"a\" href=\"/cms#a\">A</a>"));
    }

    #[test]
    fn splice_offsets_follow_macro_expansion() {
        // The recorded offset is measured in output bytes, so a macro
        // expanding to a different length than its call site must not
        // shift the splice point.
        let f = Fixture::new().with_macro("m", "ab");
        let output = f.expand("@m()$(index)X$(anchor q, Q)");
        assert!(output.starts_with("ab\t<ul>\n"));
        assert!(output.contains("</ul>\nX<a id=\"q\""));
    }

    #[test]
    fn index_sites_in_discarded_arguments_do_not_break_splicing() {
        // The $(index) runs while the unused branch is expanded, so its
        // recorded offset points at text that never reaches the output.
        let f = Fixture::new();
        let empty_index = "\t<ul>\n\t</ul>\n";
        assert_eq!(f.expand("$(if ,AAAA$(index)AAAA,)"), empty_index);

        // A stale offset must not land inside a multi-byte character.
        assert_eq!(
            f.expand("$(if ,a$(index),)é"),
            format!("{}é", empty_index)
        );
    }

    #[test]
    fn every_index_site_is_filled() {
        let f = Fixture::new();
        let output = f.expand("$(index)-$(index)-$(anchor a, A)");
        assert_eq!(
            output
                .matches("<li><a href=\"/cms#a\">A</a></li>")
                .count(),
            2
        );
    }
}
