use pyts::{compile, parse, tokenize, DiagnosticKind, ErrorReporter, TokenKind};

const SAMPLES: &[&str] = &[
    "",
    "x = 1\n",
    "if True:\n    x = 1\n",
    "def f():\n    if True:\n        while False:\n            pass\n",
    "if True:\n    x = 1\n  y = 2\n",
    "if True:\n        x = 1\n    y = 2\n",
    "    x = 1\n",
    "def f():\n\tif True:\n\t\treturn 1\n",
    "x = (1 +\n    2)\n",
    "s = \"abc\n    t = 1\n",
    "for i in range(3):\n    for j in range(i):\n        print(i, j)\n",
    "def f(:\n    return\n\n\n  x\n",
];

#[test]
fn indents_and_dedents_balance() {
    for source in SAMPLES {
        let (tokens, _) = tokenize(source);
        let indents = tokens.iter().filter(|t| t.kind == TokenKind::Indent).count();
        let dedents = tokens.iter().filter(|t| t.kind == TokenKind::Dedent).count();
        assert_eq!(indents, dedents, "unbalanced block tokens for {source:?}");
    }
}

#[test]
fn token_stream_ends_with_exactly_one_eof() {
    for source in SAMPLES {
        let (tokens, _) = tokenize(source);
        let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
        assert_eq!(eofs, 1, "{source:?}");
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }
}

#[test]
fn rendering_is_repeatable() {
    for source in SAMPLES {
        let mut reporter = ErrorReporter::new(source);
        let (_, diagnostics) = parse(source);
        for diagnostic in diagnostics {
            reporter.add(diagnostic);
        }
        let first = reporter.format_all();
        let second = reporter.format_all();
        assert_eq!(first, second);
    }
}

#[test]
fn recording_the_same_diagnostic_twice_keeps_one() {
    let (_, diagnostics) = parse("print(nombre)\n");
    let mut reporter = ErrorReporter::new("print(nombre)\n");
    assert!(reporter.add(diagnostics[0].clone()));
    assert!(!reporter.add(diagnostics[0].clone()));
    assert_eq!(reporter.diagnostics().len(), 1);
}

#[test]
fn arity_diagnostic_iff_argument_count_differs() {
    for params in 0..4 {
        for args in 0..4 {
            let names: Vec<String> = (0..params).map(|i| format!("p{i}")).collect();
            let values: Vec<String> = (0..args).map(|i| i.to_string()).collect();
            let source = format!(
                "def f({}):\n    pass\nf({})\n",
                names.join(", "),
                values.join(", ")
            );
            let result = compile(&source).expect("compile");
            let arity = result
                .diagnostics_of(DiagnosticKind::Semantic)
                .iter()
                .filter(|d| d.code == "E3004")
                .count();
            assert_eq!(arity == 1, params != args, "{source:?}: {:#?}", result.diagnostics);
            assert!(arity <= 1);
        }
    }
}

#[test]
fn inconsistent_indentation_is_always_reported() {
    let sources = [
        "if True:\n    x = 1\n  y = 2\n",
        "if True:\n    x = 1\nif True:\n      y = 2\n",
        "def f():\n    if True:\n        x = 1\n      return x\n",
    ];
    for source in sources {
        let result = compile(source).expect("compile");
        let reported = result.diagnostics.iter().any(|d| {
            d.is_error() && matches!(d.kind, DiagnosticKind::Lexical | DiagnosticKind::Syntactic)
        });
        assert!(reported, "{source:?}: {:#?}", result.diagnostics);
    }
}

#[test]
fn parameters_never_leak_out_of_their_function() {
    let result = compile("def f(secreto):\n    return secreto\nprint(secreto)\n").expect("compile");
    let undefined: Vec<&str> = result
        .diagnostics_of(DiagnosticKind::Semantic)
        .iter()
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(undefined, vec!["name 'secreto' is not defined"]);
}
