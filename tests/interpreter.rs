mod common;

#[cfg(test)]
mod interpreter_tests {
    use super::common::{run, run_err, run_ok, session};

    use rox::parser::Parser;
    use rox::scanner::Scanner;
    use rox::session::{parse_source, Mode, RunOutcome};

    #[test]
    fn test_arithmetic_and_printing() {
        assert_eq!(run_ok("print 1 + 2 * 3;"), "7\n");
        assert_eq!(run_ok("print 7 / 2;"), "3.5\n");
        assert_eq!(run_ok("print -(2 - 5);"), "3\n");
        assert_eq!(run_ok("print \"a\" + \"b\";"), "ab\n");
        assert_eq!(run_ok("print nil; print !nil; print 0 == 0;"), "nil\ntrue\ntrue\n");
    }

    #[test]
    fn test_mixed_concatenation() {
        assert_eq!(run_ok("print \"a\" + 1;"), "a1\n");
        assert_eq!(run_ok("print 1 + \"a\";"), "1a\n");
        assert_eq!(run_ok("print 1.5 + \"x\";"), "1.5x\n");
        assert_eq!(run_ok("print \"v\" + 0.1;"), "v0.1\n");

        assert_eq!(
            run_ok(
                r#"
                print "x" + 123456789.123;
                print 1.1 + "y";
                print "z" + (0.1 + 0.2);
                print "w" + 1234567.891;
                print "q" + 1 / 3;
                "#
            ),
            "x123456789.123\n1.1y\nz0.3\nw1234567.891\nq0.333333333333333\n"
        );
    }

    #[test]
    fn test_plus_rejects_other_operands() {
        let (_, message) = run_err("print true + 1;");
        assert_eq!(message, "Operands must be two numbers or two strings.");

        let (_, message) = run_err("print nil + \"a\";");
        assert_eq!(message, "Operands must be two numbers or two strings.");
    }

    #[test]
    fn test_division_by_zero_is_distinct_from_type_error() {
        let (_, message) = run_err("print 1 / 0;");
        assert_eq!(message, "Division by zero.");

        let (_, message) = run_err("print 1 / \"0\";");
        assert_eq!(message, "Operands must be numbers.");

        let (_, message) = run_err("print -\"x\";");
        assert_eq!(message, "Operand must be a number.");
    }

    #[test]
    fn test_equality_does_not_coerce() {
        assert_eq!(
            run_ok("print 1 == \"1\"; print nil == false; print \"a\" != \"b\";"),
            "false\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_relational_operators() {
        assert_eq!(
            run_ok("print 1 < 2; print 2 <= 2; print 3 > 4; print \"b\" >= \"a\";"),
            "true\ntrue\nfalse\ntrue\n"
        );
    }

    #[test]
    fn test_mixed_relational_compares_printed_forms() {
        // Operands of different types compare as the text `print` shows.
        assert_eq!(
            run_ok(
                r#"
                print "1.0" <= 1;
                print "1" <= 1;
                print "b" > 1;
                print nil < "o";
                print true > "s";
                "#
            ),
            "false\ntrue\ntrue\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok("print nil or \"yes\"; print 1 and 2; print false and undefined;"),
            "yes\n2\nfalse\n"
        );
    }

    #[test]
    fn test_conditional_evaluates_one_branch() {
        assert_eq!(run_ok("print true ? 1 : 1 / 0;"), "1\n");
        assert_eq!(run_ok("print false ? 1 / 0 : 2;"), "2\n");
    }

    #[test]
    fn test_comma_yields_last_value() {
        assert_eq!(run_ok("var a; var b; print (a = 1, b = 2, a + b);"), "3\n");
    }

    #[test]
    fn test_block_shadowing() {
        let output = run_ok(
            r#"
            var a = "outer";
            {
              var a = "inner";
              print a;
            }
            print a;
            "#,
        );

        assert_eq!(output, "inner\nouter\n");
    }

    #[test]
    fn test_assignment_updates_nearest_binding() {
        let output = run_ok(
            r#"
            var a = 1;
            {
              a = 2;
              var b = 1;
              { b = 3; }
              print b;
            }
            print a;
            "#,
        );

        assert_eq!(output, "3\n2\n");
    }

    #[test]
    fn test_undefined_variable() {
        let (_, outcome) = run("print missing;");

        match &outcome {
            RunOutcome::RuntimeFailure(e) => {
                assert_eq!(e.to_string(), "Undefined variable 'missing'.");
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(outcome.exit_code(), 70);
    }

    #[test]
    fn test_assignment_to_undeclared_fails() {
        let (_, message) = run_err("missing = 1;");
        assert_eq!(message, "Undefined variable 'missing'.");
    }

    #[test]
    fn test_uninitialized_variable() {
        let (_, message) = run_err("var a; print a;");
        assert_eq!(message, "Variable 'a' must be initialized before use.");

        let (_, message) = run_err("{ var b; print b; }");
        assert_eq!(message, "Variable 'b' must be initialized before use.");

        assert_eq!(run_ok("var c; c = 4; print c;"), "4\n");
    }

    #[test]
    fn test_runtime_error_report_and_partial_output() {
        let (output, outcome) = run("print 1;\nprint 2 - nil;\nprint 3;");

        assert_eq!(output, "1\n");

        let mut report = Vec::new();
        outcome.report(&mut report).expect("write to vec");
        assert_eq!(
            String::from_utf8(report).expect("utf-8"),
            "Operands must be numbers.\n[line 2]\n"
        );
    }

    #[test]
    fn test_while_and_for_loops() {
        assert_eq!(
            run_ok("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
        assert_eq!(
            run_ok("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn test_break_exits_innermost_loop() {
        let output = run_ok(
            r#"
            for (var i = 0; i < 3; i = i + 1) {
              while (true) {
                print i;
                break;
              }
              if (i == 1) break;
            }
            print "done";
            "#,
        );

        assert_eq!(output, "0\n1\ndone\n");
    }

    #[test]
    fn test_functions_and_recursion() {
        let output = run_ok(
            r#"
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
            fun noReturn() {}
            print noReturn();
            print fib;
            "#,
        );

        assert_eq!(output, "55\nnil\n<fn fib>\n");
    }

    #[test]
    fn test_return_from_inside_loop() {
        let output = run_ok(
            r#"
            fun first() {
              for (var i = 0; i < 10; i = i + 1) {
                if (i == 2) return i;
              }
            }
            print first();
            "#,
        );

        assert_eq!(output, "2\n");
    }

    #[test]
    fn test_closures_share_captured_state() {
        let output = run_ok(
            r#"
            fun makeCounter() {
              var count = 0;
              fun increment() {
                count = count + 1;
                return count;
              }
              return increment;
            }

            var counter = makeCounter();
            print counter();
            print counter();

            var other = makeCounter();
            print other();
            "#,
        );

        assert_eq!(output, "1\n2\n1\n");
    }

    #[test]
    fn test_two_closures_over_one_variable() {
        let output = run_ok(
            r#"
            var get;
            var set;
            {
              var shared = "before";
              fun g() { return shared; }
              fun s(v) { shared = v; }
              get = g;
              set = s;
            }
            set("after");
            print get();
            "#,
        );

        assert_eq!(output, "after\n");
    }

    #[test]
    fn test_call_errors() {
        let (_, message) = run_err("fun f(a) {} f(1, 2);");
        assert_eq!(message, "Expected 1 arguments but got 2.");

        let (_, message) = run_err("\"text\"();");
        assert_eq!(message, "Can only call functions and classes.");
    }

    #[test]
    fn test_clock_native() {
        assert_eq!(run_ok("print clock() > 0;"), "true\n");
        assert_eq!(run_ok("print clock;"), "<native fn clock>\n");

        let (_, message) = run_err("clock(1);");
        assert_eq!(message, "Expected 0 arguments but got 1.");
    }

    #[test]
    fn test_statements_can_run_twice() {
        let statements = parse_source(
            r#"
            var total = 0;
            {
              var step = 2;
              fun add() { total = total + step; }
              add();
            }
            print total;
            "#,
        )
        .expect("valid program");

        let (mut session, buffer) = session(Mode::Script);

        assert!(session.execute(&statements).is_success());
        assert!(session.execute(&statements).is_success());
        assert_eq!(buffer.contents(), "2\n2\n");
    }

    #[test]
    fn test_prompt_mode_echoes_expressions() {
        let (mut session, buffer) = session(Mode::Prompt);

        assert!(session.run("var a = 1;").is_success());
        assert!(session.run("a + 1;").is_success());
        assert!(session.run("print a;").is_success());

        assert_eq!(buffer.contents(), "2\n1\n");
    }

    #[test]
    fn test_script_mode_does_not_echo() {
        assert_eq!(run_ok("1 + 1;"), "");
    }

    #[test]
    fn test_globals_persist_across_prompt_lines() {
        let (mut session, buffer) = session(Mode::Prompt);

        assert!(session.run("fun greet(n) { return \"hi \" + n; }").is_success());
        assert!(!session.run("print missing;").is_success());
        assert!(session.run("print greet(\"there\");").is_success());

        assert_eq!(buffer.contents(), "hi there\n");
    }

    #[test]
    fn test_evaluate_single_expression() {
        let (tokens, _) = Scanner::new("(1 + 2) * 4").scan_all();
        let expr = Parser::new(&tokens).parse_expression().expect("expression");

        let (mut session, _) = session(Mode::Script);
        let value = session.interpreter().evaluate(&expr).expect("value");

        assert_eq!(value.to_string(), "12");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(run("print 1;").1.exit_code(), 0);
        assert_eq!(run("print ;").1.exit_code(), 65);
        assert_eq!(run("print 1 / 0;").1.exit_code(), 70);
    }
}
