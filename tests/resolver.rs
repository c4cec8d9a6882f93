#[cfg(test)]
mod resolver_tests {
    use quill::ast::{ExprKind, Stmt};
    use quill::error::QuillError;
    use quill::parser::Parser;
    use quill::resolver::{Locals, Resolver};
    use quill::scanner::scan;

    fn resolve(source: &str) -> (Vec<Stmt>, Result<Locals, Vec<QuillError>>) {
        let tokens = scan(source).expect("scan failed");
        let mut parser = Parser::new(source, &tokens);
        let statements = parser.parse();

        assert!(
            parser.errors().is_empty(),
            "unexpected parse errors: {:?}",
            parser.errors()
        );

        let result = Resolver::new(source).resolve(&statements);

        (statements, result)
    }

    fn messages(source: &str) -> Vec<String> {
        match resolve(source).1 {
            Ok(_) => Vec::new(),
            Err(errors) => errors.iter().map(QuillError::message).collect(),
        }
    }

    fn assert_single_error(source: &str, expected: &str) {
        let found = messages(source);

        assert_eq!(found.len(), 1, "errors for {:?}: {:?}", source, found);
        assert!(
            found[0].starts_with(expected),
            "expected {:?}, got {:?}",
            expected,
            found[0]
        );
    }

    #[test]
    fn test_valid_program_resolves() {
        let source = "var a = 1;\n\
                      function f(x) { var y = x; return a + y; }\n\
                      class A { A(v) { this.v = v; } get() { return this.v; } }\n\
                      class B : A { get() { return base.get(); } }";

        assert!(resolve(source).1.is_ok());
    }

    #[test]
    fn test_globals_are_left_out_of_the_table() {
        let (statements, result) = resolve("var a = 1; a;");
        let locals = result.unwrap();

        let Stmt::Expression(expr) = &statements[1] else {
            panic!("expected an expression statement");
        };

        assert!(!locals.contains_key(&expr.id));
    }

    #[test]
    fn test_local_distances() {
        let source = "{ var a = 1; { var b = 2; a; b; } }";
        let (statements, result) = resolve(source);
        let locals = result.unwrap();

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected a nested block");
        };

        let distance = |stmt: &Stmt| match stmt {
            Stmt::Expression(expr) => {
                assert!(matches!(expr.kind, ExprKind::Variable(_)));
                locals.get(&expr.id).copied()
            }
            other => panic!("unexpected statement {:?}", other),
        };

        assert_eq!(distance(&inner[1]), Some(1));
        assert_eq!(distance(&inner[2]), Some(0));
    }

    #[test]
    fn test_this_and_base_distances() {
        let source = "class A { m() {} }\nclass B : A { m() { this; base.m; } }";
        let (statements, result) = resolve(source);
        let locals = result.unwrap();

        let Stmt::Class { methods, .. } = &statements[1] else {
            panic!("expected a class");
        };

        let body = &methods[0].body;
        let id_of = |stmt: &Stmt| match stmt {
            Stmt::Expression(expr) => expr.id,
            other => panic!("unexpected statement {:?}", other),
        };

        assert_eq!(locals.get(&id_of(&body[0])), Some(&1));
        assert_eq!(locals.get(&id_of(&body[1])), Some(&2));
    }

    #[test]
    fn test_own_initializer() {
        assert_single_error(
            "{ var a = 1; { var a = a; } }",
            "Can't read local variable in its own initializer.",
        );

        // At global scope the name simply refers to the global.
        assert!(messages("var a = 1; var a = a;").is_empty());
    }

    #[test]
    fn test_duplicate_local() {
        assert_single_error(
            "function f() { var a = 1; var a = 2; }",
            "Already a variable with this name in this scope.",
        );

        assert_single_error(
            "function f(a, a) {}",
            "Already a variable with this name in this scope.",
        );

        // Globals may be redeclared.
        assert!(messages("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_return_rules() {
        assert_single_error("return 1;", "Can't return from top-level code.");

        assert!(messages("function f() { while (true) { return 1; } }").is_empty());

        assert_single_error(
            "class A { A() { return 1; } }",
            "Can't return a value from a constructor.",
        );

        // A bare return is fine in a constructor.
        assert!(messages("class A { A() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_single_error("this;", "Can't use 'this' outside of a class.");
        assert_single_error(
            "function f() { return this; }",
            "Can't use 'this' outside of a class.",
        );
    }

    #[test]
    fn test_base_misuse() {
        assert_single_error("base.m;", "Can't use 'base' outside of a class.");
        assert_single_error(
            "class A { m() { return base.m; } }",
            "Can't use 'base' in a class with no base class.",
        );
    }

    #[test]
    fn test_self_inheritance() {
        assert_single_error("class A : A {}", "A class can't inherit from itself.");
    }

    #[test]
    fn test_errors_are_collected() {
        let source = "return;\nthis;\n{ var a = a; }";
        let (_, result) = resolve(source);
        let errors = result.unwrap_err();

        let lines: Vec<usize> = errors
            .iter()
            .map(|e| match e {
                QuillError::Resolve { line, .. } => *line,
                other => panic!("expected a resolve error, got {:?}", other),
            })
            .collect();

        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_error_names_the_token() {
        let found = messages("this;");

        assert_eq!(found, vec!["Can't use 'this' outside of a class. (at 'this')"]);
    }
}
