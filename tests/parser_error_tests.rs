use giosue::parser::Parser;
use giosue::{CompileError, ErrorKind, scanner};

fn parse_errors(source: &str) -> Vec<CompileError> {
    let tokens = scanner::scan(source).expect("scan should succeed");
    Parser::new(tokens).parse().unwrap_err()
}

#[test]
fn missing_semicolon_in_nested_function_reports_single_error() {
    let source = include_str!("../fixtures/error_missing_semicolon.gsu");
    let errors = parse_errors(source);
    assert_eq!(
        errors.len(),
        1,
        "expected 1 error but got {}: {errors:?}",
        errors.len()
    );
    assert_eq!(errors[0].kind(), ErrorKind::ExpectedToken);
    assert_eq!(errors[0].line(), 4);
    assert!(
        errors[0].message().contains("';'"),
        "error should mention missing semicolon: {}",
        errors[0]
    );
}

#[test]
fn multiple_independent_errors_all_reported() {
    let source = "variabile x = 1\nScriveLina(x);\nvariabile y = 2\nScriveLina(y);\n";
    let errors = parse_errors(source);
    assert_eq!(
        errors.len(),
        2,
        "each missing semicolon should be reported independently: {errors:?}"
    );
    assert_eq!(errors[0].line(), 2);
    assert_eq!(errors[1].line(), 4);
}

#[test]
fn bad_expression_then_good_statement() {
    let errors = parse_errors("1 + ;  2 + 3;");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::ExpectedExpression);
}

#[test]
fn error_in_second_function_does_not_hide_first_body() {
    let source = "funzione a() { ritorna 1; }\nfunzione b() { ritorna ) ; }\nfunzione c() { ritorna 3; }";
    let errors = parse_errors(source);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].line(), 2);
}

#[test]
fn errors_render_as_diagnostics() {
    let errors = parse_errors("variabile = 3;");
    let report = miette::Report::new(
        errors
            .into_iter()
            .next()
            .unwrap()
            .with_source_code("prova.gsu", "variabile = 3;"),
    );
    let rendered = format!("{report:?}");
    assert!(rendered.contains("variable name"), "{rendered}");
}

#[test]
fn error_at_block_end_does_not_swallow_following_code() {
    let errors = parse_errors("{ x = 1 + }\nScriveLina(2);\nvariabile y = ;");
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert_eq!(errors[0].kind(), ErrorKind::ExpectedExpression);
    assert_eq!(errors[0].line(), 1);
    assert_eq!(errors[1].line(), 3);
}

#[test]
fn malformed_if_reports_once_even_with_else_branch() {
    let errors = parse_errors("se (vero) 1 + ; oppure 2;\nScriveLina(3);");
    assert_eq!(errors.len(), 1, "{errors:?}");
}
