#[cfg(test)]
mod parser_tests {
    use rox::ast_printer::AstPrinter;
    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::session::parse_source;

    fn expression(source: &str) -> String {
        let (tokens, errors) = Scanner::new(source).scan_all();
        assert!(errors.is_empty(), "lex errors: {:?}", errors);

        let expr = Parser::new(&tokens)
            .parse_expression()
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e));
        AstPrinter::print(&expr)
    }

    fn program(source: &str) -> Vec<String> {
        parse_source(source)
            .unwrap_or_else(|errors| panic!("failed to parse {:?}: {:?}", source, errors))
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    fn errors(source: &str) -> Vec<String> {
        match parse_source(source) {
            Ok(statements) => panic!("expected errors, parsed {:?}", statements),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(expression("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(expression("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(expression("-1 < 2 == !false"), "(== (< (- 1.0) 2.0) (! false))");
        assert_eq!(expression("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_conditional_is_right_associative() {
        assert_eq!(expression("a ? b : c ? d : e"), "(?: a b (?: c d e))");
        assert_eq!(expression("a or b ? 1 : 2"), "(?: (or a b) 1.0 2.0)");
    }

    #[test]
    fn test_comma_has_lowest_precedence() {
        assert_eq!(expression("a = 1, b = 2"), "(, (= a 1.0) (= b 2.0))");
        assert_eq!(expression("f(1, 2)"), "(call f 1.0 2.0)");
    }

    #[test]
    fn test_assignment_targets() {
        assert_eq!(expression("a = b = 3"), "(= a (= b 3.0))");
        assert_eq!(expression("obj.field = 1"), "(.= obj field 1.0)");
        assert_eq!(expression("a.b.c()"), "(call (. (. a b) c))");
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            errors("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target"]
        );
    }

    #[test]
    fn test_statements() {
        assert_eq!(
            program("var x = 1; var y; print x; { x; }"),
            vec!["(var x 1.0)", "(var y)", "(print x)", "(block (; x))"]
        );
        assert_eq!(
            program("if (a) print 1; else print 2;"),
            vec!["(if-else a (print 1.0) (print 2.0))"]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            program("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
        assert_eq!(program("for (;;) break;"), vec!["(while true (break))"]);
    }

    #[test]
    fn test_functions_and_classes() {
        assert_eq!(
            program("fun add(a, b) { return a + b; }"),
            vec!["(fun add(a b) (return (+ a b)))"]
        );
        assert_eq!(
            program("class Point { init(x) { this.x = x; } }"),
            vec!["(class Point (method init(x) (; (.= this x x))))"]
        );
    }

    #[test]
    fn test_errors_are_collected_after_synchronizing() {
        let errors = errors("var = 1;\nprint ;\nvar ok = 2;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expected variable name",
                "[line 2] Error at ';': Expected expression",
            ]
        );
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            errors("print 1"),
            vec!["[line 1] Error at end: Expected ';' after value"]
        );
    }

    #[test]
    fn test_lex_and_parse_errors_reported_together() {
        let errors = errors("@\nprint ;");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], "[line 1] Error: Unexpected character: @");
        assert!(errors[1].starts_with("[line 2] Error at ';'"));
    }

    #[test]
    fn test_trailing_tokens_after_expression() {
        let (tokens, _) = Scanner::new("1 2").scan_all();
        let err = Parser::new(&tokens)
            .parse_expression()
            .expect_err("trailing token");

        assert_eq!(err.to_string(), "[line 1] Error at '2': Expected end of expression");
    }
}
