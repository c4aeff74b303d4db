#[cfg(test)]
mod verify {
    use crate::fixture::Fixture;

    #[test]
    fn simple_expansion() {
        let f = Fixture::new().with_macro("greet", "Hello $1!");
        assert_eq!(f.expand("@greet(World)"), "Hello World!");
    }

    #[test]
    fn arguments_are_trimmed() {
        let f = Fixture::new().with_macro("greet", "Hello $1!");
        assert_eq!(f.expand("@greet(  World  )"), "Hello World!");
    }

    #[test]
    fn escaped_delimiters_in_arguments() {
        let f = Fixture::new().with_macro("greet", "Hello $1!");
        assert_eq!(f.expand(r"@greet(a\,b)"), "Hello a,b!");
    }

    #[test]
    fn argument_zero_is_the_macro_name() {
        let f = Fixture::new().with_macro("me", "$0");
        assert_eq!(f.expand("@me()"), "me");
    }

    #[test]
    fn out_of_range_arguments_are_empty() {
        let f = Fixture::new().with_macro("two", "[$1][$2][$3]");
        assert_eq!(f.expand("@two(a, b)"), "[a][b][]");
    }

    #[test]
    fn arguments_are_scoped_to_their_frame() {
        let f = Fixture::new()
            .with_macro("outer", "@inner(X)$1")
            .with_macro("inner", "$1");
        assert_eq!(f.expand("@outer(Y)"), "XY");
    }

    #[test]
    fn missing_macros_expand_to_nothing() {
        let f = Fixture::new();
        assert_eq!(f.expand("a@nothere()b"), "ab");
    }

    #[test]
    fn invalid_macro_names_fail() {
        let f = Fixture::new();
        let error = f.expand_err("@bad/name(x)");
        assert_eq!(error.status, 500);
        assert_eq!(
            error.message,
            "Macro name 'bad/name' contains invalid characters"
        );
    }

    #[test]
    fn a_call_without_parentheses_is_literal() {
        let f = Fixture::new().with_macro("greet", "Hello $1!");
        assert_eq!(f.expand("mail@example.org"), "mail@example.org");
    }

    #[test]
    fn call_stack_depth_limit() {
        // A chain of exactly 64 nested calls is fine.
        let mut f = Fixture::new().with_macro("c64", "ok");
        for i in 1..64 {
            f.store
                .macros
                .insert(format!("c{}", i), format!("@c{}()", i + 1));
        }
        assert_eq!(f.expand("@c1()"), "ok");

        // One more is not.
        f.store
            .macros
            .insert("c64".to_string(), "@c65()".to_string());
        f.store
            .macros
            .insert("c65".to_string(), "never".to_string());
        let error = f.expand_err("@c1()");
        assert_eq!(error.status, 500);
        assert_eq!(error.message, "Exceeded macro call stack depth");
    }

    #[test]
    fn debug_errors_carry_macro_and_line() {
        let f = Fixture::new()
            .debug()
            .with_macro("boom", "line one\n$(assert )");
        let error = f.expand_err("@boom()");
        assert_eq!(error.status, 500);
        assert_eq!(error.message, "boom:2: ASSERT: failed");
    }
}
