use std::fs;
use std::path::{Path, PathBuf};

use pyts::compile;
use walkdir::WalkDir;

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

fn bless_enabled() -> bool {
    std::env::var("PYTS_BLESS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n")
}

fn python_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("py"))
        .collect();
    files.sort();
    files
}

/// Codes listed on a leading `# expect: E3001 E2006` line.
fn expected_codes(source: &str) -> Vec<String> {
    source
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("# expect:"))
        .map(|codes| codes.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[test]
fn valid_fixtures_match_golden_output() {
    let files = python_files(&fixtures_root().join("valid"));
    assert!(!files.is_empty(), "no valid fixtures found");

    let mut failures = Vec::new();
    for path in files {
        let source = normalize_newlines(&fs::read_to_string(&path).expect("read fixture"));
        let result = compile(&source).expect("compile fixture");
        let errors: Vec<String> = result
            .diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| format!("{} {}:{} {}", d.code, d.line(), d.column(), d.message))
            .collect();
        if !errors.is_empty() {
            failures.push(format!("{}\n  {}", path.display(), errors.join("\n  ")));
            continue;
        }
        let code = result.generated_code.unwrap_or_default();
        let golden = path.with_extension("ts");
        if bless_enabled() {
            fs::write(&golden, &code).expect("write blessed golden");
            continue;
        }
        let Ok(expected) = fs::read_to_string(&golden) else {
            failures.push(format!("{}: missing golden {}", path.display(), golden.display()));
            continue;
        };
        if normalize_newlines(&expected) != code {
            failures.push(format!(
                "{}: output differs from golden\n--- expected\n{}\n--- actual\n{}",
                path.display(),
                expected,
                code
            ));
        }
    }

    if !failures.is_empty() {
        panic!(
            "fixture failures (set PYTS_BLESS=1 to update goldens):\n{}",
            failures.join("\n\n")
        );
    }
}

#[test]
fn invalid_fixtures_report_expected_codes() {
    let files = python_files(&fixtures_root().join("invalid"));
    assert!(!files.is_empty(), "no invalid fixtures found");

    let mut failures = Vec::new();
    for path in files {
        let source = normalize_newlines(&fs::read_to_string(&path).expect("read fixture"));
        let expected = expected_codes(&source);
        assert!(
            !expected.is_empty(),
            "{} has no '# expect:' header",
            path.display()
        );
        let result = compile(&source).expect("compile fixture");
        let reported: Vec<&str> = result.diagnostics.iter().map(|d| d.code.as_str()).collect();
        let missing: Vec<&String> = expected
            .iter()
            .filter(|code| !reported.contains(&code.as_str()))
            .collect();
        if !missing.is_empty() || result.success {
            failures.push(format!(
                "{}: missing {missing:?}, reported {reported:?}, success {}",
                path.display(),
                result.success
            ));
        }
    }

    if !failures.is_empty() {
        panic!("fixture failures:\n{}", failures.join("\n"));
    }
}
