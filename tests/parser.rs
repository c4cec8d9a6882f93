#[cfg(test)]
mod parser_tests {
    use quill::ast::{ExprKind, Stmt};
    use quill::ast_printer::AstPrinter;
    use quill::error::QuillError;
    use quill::parser::Parser;
    use quill::scanner::scan;

    fn parse(source: &str) -> (Vec<String>, Vec<QuillError>) {
        let tokens = scan(source).expect("scan failed");
        let mut parser = Parser::new(source, &tokens);
        let statements = parser.parse();
        let printer = AstPrinter::new(source);

        (
            statements.iter().map(|s| printer.print_stmt(s)).collect(),
            parser.take_errors(),
        )
    }

    fn parse_ok(source: &str) -> Vec<String> {
        let (printed, errors) = parse(source);

        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);

        printed
    }

    fn lines(errors: &[QuillError]) -> Vec<usize> {
        errors
            .iter()
            .map(|e| match e {
                QuillError::Parse { line, .. } => *line,
                other => panic!("expected a parse error, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_var_declaration() {
        assert_eq!(parse_ok("var x = 1 + 2;"), vec!["(var x = (+ 1 2))"]);
        assert_eq!(parse_ok("var y;"), vec!["(var y)"]);
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_ok("print(-1 + 2 * 3 == 7 && !false || nil);"),
            vec!["(; (call print (|| (&& (== (+ (- 1) (* 2 3)) 7) (! false)) nil)))"]
        );

        assert_eq!(
            parse_ok("(1 + 2) * 3 - 4 / 2;"),
            vec!["(; (- (* (group (+ 1 2)) 3) (/ 4 2)))"]
        );

        // Assignment is right associative.
        assert_eq!(parse_ok("a = b = c;"), vec!["(; (= a (= b c)))"]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse_ok("f(\"text\", 2.5, 3, true, false, nil);"),
            vec!["(; (call f text 2.5 3 true false nil))"]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            parse_ok("for(var i = 0; i < 10; i = i + 1) {}"),
            vec!["(block (var i = 0) (while (< i 10) (block (block) (; (= i (+ i 1))))))"]
        );

        // Every clause omitted: an unconditional loop and nothing else.
        assert_eq!(parse_ok("for (;;) {}"), vec!["(while true (block))"]);
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            parse_ok("if (x) print(1); else { }"),
            vec!["(if-else x (; (call print 1)) (block))"]
        );

        assert_eq!(
            parse_ok("while (x > 0) x = x - 1;"),
            vec!["(while (> x 0) (; (= x (- x 1))))"]
        );

        // The dangling else binds to the nearest if.
        assert_eq!(
            parse_ok("if (a) if (b) c; else d;"),
            vec!["(if a (if-else b (; c) (; d)))"]
        );
    }

    #[test]
    fn test_functions_and_returns() {
        assert_eq!(
            parse_ok("function add(a, b) { return a + b; }"),
            vec!["(function add(a b) (return (+ a b)))"]
        );

        assert_eq!(
            parse_ok("function noop() { return; }"),
            vec!["(function noop() (return))"]
        );
    }

    #[test]
    fn test_property_chains() {
        assert_eq!(
            parse_ok("a.b(c).d = e;"),
            vec!["(; (= (call (. a b) c).d e))"]
        );
    }

    #[test]
    fn test_class_declaration() {
        let source = "class B : A {\n  B(x) { this.x = x; }\n  function get() { return base.v; }\n}";

        assert_eq!(
            parse_ok(source),
            vec!["(class B : A (function B(x) (; (= this.x x))) (function get() (return (base v))))"]
        );

        assert_eq!(parse_ok("class Empty {}"), vec!["(class Empty)"]);
    }

    #[test]
    fn test_recovery_drops_only_bad_declarations() {
        let source = "var a = 1;\nvar = 2;\nprint(a);\n1 +;\nvar b = 3;";
        let (printed, errors) = parse(source);

        assert_eq!(
            printed,
            vec!["(var a = 1)", "(; (call print a))", "(var b = 3)"]
        );
        assert_eq!(lines(&errors), vec![2, 4]);
    }

    #[test]
    fn test_program_prints_one_line_per_statement() {
        let source = "var a = 1;\nif (a) print(a);\n\nclass C {}";
        let tokens = scan(source).unwrap();
        let statements = Parser::new(source, &tokens).parse();

        assert_eq!(
            AstPrinter::new(source).print_program(&statements),
            "(var a = 1)\n(if a (; (call print a)))\n(class C)"
        );
        assert_eq!(AstPrinter::new(source).print_program(&[]), "");
    }

    #[test]
    fn test_recovery_inside_block() {
        let (printed, errors) = parse("{ var = 1; var y = 2; }");

        assert_eq!(printed, vec!["(block (var y = 2))"]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_error_messages() {
        let (printed, errors) = parse("1 = 2;");
        assert!(printed.is_empty());
        assert_eq!(errors[0].message(), "Invalid assignment target.");

        let (_, errors) = parse("var x = 1");
        assert_eq!(errors[0].message(), "Expect ';' after variable declaration.");

        let (_, errors) = parse("class { }");
        assert_eq!(errors[0].message(), "Expect class name.");

        let (_, errors) = parse(";");
        assert_eq!(errors[0].message(), "Expect expression.");

        let (_, errors) = parse("{ var x = 1;");
        assert_eq!(errors[0].message(), "Expect '}' after block.");
    }

    #[test]
    fn test_adjacent_operators_are_rejected() {
        // `==` without a following separator lexes as two `=`.
        let (_, errors) = parse("print(a==b);");

        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("function f({}) {{}}", params.join(", "));
        let (printed, errors) = parse(&source);

        assert!(printed.is_empty());
        assert_eq!(errors[0].message(), "Can't have more than 255 parameters.");
    }

    #[test]
    fn test_expression_ids_are_distinct() {
        let source = "x; x;";
        let tokens = scan(source).unwrap();
        let statements = Parser::new(source, &tokens).parse();

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(expr) => {
                    assert!(matches!(expr.kind, ExprKind::Variable(_)));
                    expr.id
                }
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
