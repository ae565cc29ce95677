use super::parse;
use crate::ast::*;
use crate::diagnostics::Diagnostic;

fn error_codes(diags: &[Diagnostic]) -> Vec<String> {
    let mut codes: Vec<String> = diags
        .iter()
        .filter(|d| d.is_error())
        .map(|d| d.code.clone())
        .collect();
    codes.sort();
    codes
}

fn check_ok(source: &str) -> Program {
    let (program, diags) = parse(source);
    assert!(
        diags.iter().all(|d| !d.is_error()),
        "unexpected diagnostics: {diags:#?}"
    );
    program
}

fn check_err(source: &str, expected: &[&str]) -> (Program, Vec<Diagnostic>) {
    let (program, diags) = parse(source);
    assert_eq!(error_codes(&diags), expected, "diagnostics: {diags:#?}");
    (program, diags)
}

#[test]
fn first_binding_declares_later_ones_assign() {
    let program = check_ok("x = 5\nx = 6\n");
    assert!(matches!(
        &program.statements[0],
        Stmt::VarDecl { declared_type, .. } if declared_type == "int"
    ));
    assert!(matches!(
        &program.statements[1],
        Stmt::ExpressionStmt { expr: Expr::Assign { op, .. }, .. } if op == "="
    ));
}

#[test]
fn forward_and_mutual_calls_resolve() {
    check_ok("def a(n):\n    return b(n)\ndef b(n):\n    return a(n)\nprint(a(1))\n");
}

#[test]
fn return_outside_function() {
    let (_, diags) = check_err("x = 5\nreturn x\n", &["E3003"]);
    assert_eq!(diags[0].message, "'return' outside function");
    assert_eq!(diags[0].line(), 2);
}

#[test]
fn break_and_continue_need_an_enclosing_loop() {
    check_err("break\n", &["E3006"]);
    check_ok("while True:\n    break\n");
    check_ok("for i in range(3):\n    if i == 1:\n        continue\n");
    check_err(
        "for i in range(3):\n    def f():\n        break\n",
        &["E3006"],
    );
}

#[test]
fn undefined_name_suggests_close_match() {
    let (_, diags) = check_err("total = 1\nprint(totl)\n", &["E3001"]);
    assert_eq!(diags[0].message, "name 'totl' is not defined");
    assert_eq!(diags[0].suggestion.as_deref(), Some("did you mean 'total'?"));
}

#[test]
fn undefined_callee_is_reported_as_function() {
    let (_, diags) = check_err("suma(1)\n", &["E3001"]);
    assert_eq!(diags[0].message, "function 'suma' is not defined");
}

#[test]
fn arity_mismatch_for_user_functions() {
    let (_, diags) = check_err("def f(a, b):\n    return a\nf(1)\n", &["E3004"]);
    assert!(diags[0].message.contains("expects 2 arguments but got 1"));
    check_ok("def f(a, b):\n    return a\nf(1, 2)\n");
}

#[test]
fn arity_for_builtins_uses_bounds() {
    check_ok("print()\nprint(1, 2, 3)\nfor i in range(1, 10, 2):\n    pass\n");
    check_err("len()\n", &["E3004"]);
    check_err("for i in range(1, 2, 3, 4):\n    pass\n", &["E3004"]);
}

#[test]
fn calling_a_plain_value() {
    check_err("x = 5\nx()\n", &["E3005"]);
}

#[test]
fn operand_type_errors() {
    check_err("s = \"a\" + 1\n", &["E4001"]);
    check_err("lista = [1, 2]\ny = lista + 5\n", &["E4001"]);
    check_ok("x = 1 + 2.5\ny = \"a\" * 3\n");
}

#[test]
fn annotated_declaration_mismatch() {
    let (program, _) = check_err("numero: int = \"123\"\n", &["E4002"]);
    assert!(matches!(
        &program.statements[0],
        Stmt::VarDecl { annotation: Some(hint), .. } if hint.name == "int"
    ));
    check_ok("precio: float = 10\n");
}

#[test]
fn return_type_mismatch() {
    check_err("def f() -> int:\n    return \"a\"\n", &["E4003"]);
    check_ok("def f() -> float:\n    return 1\n");
}

#[test]
fn argument_type_mismatch() {
    let (_, diags) = check_err(
        "def doble(n: int) -> int:\n    return n * 2\ndoble(\"x\")\n",
        &["E4004"],
    );
    assert!(diags[0].message.contains("parameter 'n' expects 'int'"));
}

#[test]
fn trailing_comma_in_call_and_parameters() {
    let (_, diags) = check_err("resultado = suma(5,)\n", &["E2006", "E3001"]);
    let comma = diags.iter().find(|d| d.code == "E2006").expect("comma");
    assert_eq!(comma.message, "trailing comma in argument list");
    assert_eq!(
        comma.suggestion.as_deref(),
        Some("remove the comma or add another argument")
    );
    check_err("def f(a,):\n    return a\n", &["E2006"]);
    check_ok("xs = [1,]\n");
}

#[test]
fn bracket_scan_owns_missing_closer_reports() {
    let (program, _) = check_err("x = (1 + 2\ny = 3\nprint(y)\n", &["E2009"]);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn classes_are_rejected_and_skipped() {
    let (program, _) = check_err("class A:\n    x = 1\n    y = 2\nz = 3\n", &["E2010"]);
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn decorators_attach_to_functions() {
    let program = check_ok("@cache\ndef f():\n    pass\n");
    assert!(matches!(
        &program.statements[0],
        Stmt::FunctionDecl { decorators, .. } if decorators[0].name == "cache"
    ));
    let (program, _) = check_err("@cache\nx = 1\n", &["E2012"]);
    assert!(matches!(&program.statements[0], Stmt::VarDecl { .. }));
}

#[test]
fn elif_chains_nest_in_else_branch() {
    let program = check_ok(
        "x = 1\nif x > 1:\n    y = 1\nelif x > 0:\n    y = 2\nelse:\n    y = 3\n",
    );
    let Stmt::If {
        else_branch: Some(else_branch),
        ..
    } = &program.statements[1]
    else {
        panic!("expected if statement");
    };
    assert!(matches!(
        else_branch.as_slice(),
        [Stmt::If {
            else_branch: Some(_),
            ..
        }]
    ));
}

#[test]
fn failed_header_discards_its_block_quietly() {
    let (program, _) = check_err("x = 1\nif x > 1\n    return zz\nprint(x)\n", &["E2002"]);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn unexpected_indent_still_parses_statements() {
    check_err("x = 1\n    y = 2\nprint(y)\n", &["E2005"]);
}

#[test]
fn missing_block_is_reported() {
    check_err("def f():\nreturn 1\n", &["E2004", "E3003"]);
}

#[test]
fn augmented_assignment_needs_existing_target() {
    check_err("contador += 1\n", &["E3001"]);
    check_err("s = \"a\"\ns += 1\n", &["E4001"]);
    check_ok("n = 0\nn += 2\n");
}

#[test]
fn range_with_zero_step() {
    check_err("for i in range(0, 10, 0):\n    pass\n", &["E3007"]);
}

#[test]
fn fstring_placeholders_are_parsed() {
    let program = check_ok("nombre = \"Ana\"\nmsg = f\"hola {nombre}!\"\n");
    let Stmt::VarDecl { value, .. } = &program.statements[1] else {
        panic!("expected declaration");
    };
    let Expr::Literal(Literal {
        value: LiteralValue::FString(parts),
        ..
    }) = value
    else {
        panic!("expected f-string");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], FStringPart::Text("hola ".to_string()));
    assert!(matches!(&parts[1], FStringPart::Expr(Expr::Identifier(name)) if name.name == "nombre"));
}

#[test]
fn fstring_placeholder_names_are_checked_in_place() {
    let (_, diags) = check_err("msg = f\"{desconocido}\"\n", &["E3001"]);
    assert_eq!(diags[0].line(), 1);
    assert_eq!(diags[0].column(), 10);
    assert_eq!(diags[0].source_line, "msg = f\"{desconocido}\"");
}

#[test]
fn functions_bind_globally_but_parameters_do_not() {
    check_ok("def outer():\n    def inner():\n        return 1\n    return inner()\nprint(inner())\n");
    check_err("def f(a):\n    return a\nprint(a)\n", &["E3001"]);
}

#[test]
fn keyword_arguments_are_rejected() {
    check_err("print(\"a\", end=\"\")\n", &["E2014"]);
}

#[test]
fn redefinitions() {
    check_err("def f():\n    pass\nf = 3\n", &["E3002"]);
    check_err("def f():\n    pass\ndef f():\n    pass\n", &["E3002"]);
    check_err("def print(x):\n    pass\n", &["E3002"]);
}

#[test]
fn typo_warning_does_not_replace_semantic_error() {
    let (_, diags) = check_err("pritn(1)\n", &["E3001"]);
    assert!(diags.iter().any(|d| d.code == "W1001" && !d.is_error()));
}

#[test]
fn invalid_assignment_target() {
    check_err("x = 1\nx + 1 = 2\n", &["E2011"]);
}

#[test]
fn unterminated_string_does_not_cascade() {
    let (_, diags) = parse("nombre = \"abc\nedad = 30\n");
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, "E1001");
}

#[test]
fn membership_and_method_calls() {
    check_ok("xs = [1, 2]\nif 1 in xs and 3 not in xs:\n    xs.append(3)\n");
}

#[test]
fn single_line_suites() {
    let program = check_ok("x = 1\nif x > 0: print(x)\nelse: print(0)\n");
    assert!(matches!(
        &program.statements[1],
        Stmt::If { then_branch, else_branch: Some(_), .. } if then_branch.len() == 1
    ));
}

#[test]
fn loop_variable_takes_element_type() {
    check_err("for i in range(3):\n    s = i + \"a\"\n", &["E4001"]);
}
