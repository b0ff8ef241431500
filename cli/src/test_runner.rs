use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use codespan_reporting::term::termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use serde::Deserialize;

use renderer::{Diagnostic, MemoryTree};

const TEST_SUFFIX: &str = ".test.hcl";

#[derive(Debug, Deserialize)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the diagnostic, e.g. "iteration error".
    pub contains: String,

    /// If set, the diagnostic's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Host variables passed to the render call.
    #[serde(default)]
    pub variables: Option<toml::Table>,

    /// Expected HTML of the mount point after rendering (trimmed comparison).
    #[serde(default)]
    pub expect_html: Option<String>,

    /// Expected render error: the error string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Expected diagnostics. If present (even empty), count and content are checked.
    #[serde(default)]
    pub expect_diagnostics: Option<Vec<ExpectedDiagnostic>>,
}

/// Parse a `.test.hcl` file into its TOML config and document source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..]; // skip \n---
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Ok(content) => match parse_test_file(&content) {
            Ok((config, source)) => {
                let outcome = match check_test(&config, source) {
                    None => TestOutcome::Pass,
                    Some(reason) => TestOutcome::Fail(reason),
                };
                (config.description, outcome)
            }
            Err(e) => (None, TestOutcome::Fail(format!("frontmatter error: {}", e))),
        },
        Err(e) => (None, TestOutcome::Fail(format!("cannot read file: {}", e))),
    };

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Render one test document and compare it with its expectations.
/// Returns `Some(reason)` on the first mismatch.
fn check_test(config: &TestConfig, source: &str) -> Option<String> {
    let parse_result = hdoc::parser::Parser::new(source.to_string(), 0).parse();

    if config.expect_parse_error {
        return match parse_result {
            Err(_) => None,
            Ok(_) => Some("expected parse error, but parsing succeeded".into()),
        };
    }

    // A parse failure may still be the expected render error
    if let (Err(errors), None) = (&parse_result, &config.expect_error) {
        return Some(format!(
            "unexpected parse error: {}",
            hdoc::parser::summarize_all(&errors, renderer::bridge::SOURCE_NAME, source)
        ));
    }

    let variables = match &config.variables {
        Some(table) => match serde_json::to_value(table) {
            Ok(v) => v,
            Err(e) => return Some(format!("invalid variables: {}", e)),
        },
        None => serde_json::Value::Null,
    };

    let mut tree = MemoryTree::new();
    let mount = tree.root();
    let result = renderer::render(source, &variables, &mut tree, &mount);
    let html = tree.to_html(mount);

    let mismatch = match (&config.expect_error, &config.expect_html, &result.error) {
        (Some(expected_err), _, Some(err)) => (!err.contains(expected_err.as_str())).then(|| {
            format!(
                "expected error containing \"{}\", got: {}",
                expected_err, err
            )
        }),
        (Some(expected_err), _, None) => Some(format!(
            "expected error containing \"{}\", but rendering succeeded",
            expected_err
        )),
        (None, _, Some(err)) => Some(format!("unexpected render error: {}", err)),
        (None, Some(expected_html), None) => {
            let expected = expected_html.trim();
            (html != expected).then(|| {
                format!(
                    "html mismatch\n  expected: {}\n  actual:   {}",
                    expected, html
                )
            })
        }
        (None, None, None) => None,
    };
    if mismatch.is_some() {
        return mismatch;
    }

    config
        .expect_diagnostics
        .as_ref()
        .and_then(|expected| check_diagnostics(source, &result.diagnostics, expected))
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual diagnostics match expectations. Returns `Some(reason)` on mismatch.
fn check_diagnostics(
    source: &str,
    diagnostics: &[Diagnostic],
    expected: &[ExpectedDiagnostic],
) -> Option<String> {
    if diagnostics.len() != expected.len() {
        let actual_msgs: Vec<String> = diagnostics.iter().map(|d| format!("  - {}", d)).collect();
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            diagnostics.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in diagnostics.iter().zip(expected.iter()).enumerate() {
        let msg = actual.to_string();

        if !msg.contains(&expected.contains) {
            return Some(format!(
                "diagnostic[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, msg
            ));
        }

        if let Some(expected_line) = expected.line {
            let Some(span) = &actual.span else {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, but diagnostic has no span",
                    i, expected_line
                ));
            };
            let actual_line = byte_offset_to_line(source, span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "diagnostic[{}]: expected on line {}, but span is on line {}",
                    i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// Discover `.test.hcl` files grouped by category (directory relative to
/// `root`, "" for files directly inside it), sorted by category then path.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if is_test_file(&path) {
                categories.entry(category_of(&path, root)).or_default().push(path);
            }
        }
    }
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEST_SUFFIX))
}

fn category_of(path: &Path, root: &Path) -> String {
    path.parent()
        .and_then(|p| p.strip_prefix(root).ok())
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default()
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Select the categories to run. Requesting `a` also selects `a/b`.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a [PathBuf]> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect();
    }

    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let nested = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&nested) {
                selected.insert(category.as_str(), files.as_slice());
            }
        }
        if selected.len() == before {
            let available: Vec<&str> = all.keys().map(|k| category_label(k)).collect();
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                available.join(", ")
            );
        }
    }
    selected
}

/// Colored status output on stderr.
struct Reporter {
    out: StandardStream,
}

impl Reporter {
    fn new(no_color: bool) -> Self {
        let choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            out: StandardStream::stderr(choice),
        }
    }

    fn styled(&mut self, text: &str, spec: &ColorSpec) {
        let _ = self.out.set_color(spec);
        let _ = write!(self.out, "{}", text);
        let _ = self.out.reset();
    }

    fn heading(&mut self, text: &str) {
        let _ = writeln!(self.out);
        self.styled(text, ColorSpec::new().set_bold(true));
        let _ = writeln!(self.out);
    }

    fn status(&mut self, result: &TestResult) {
        let (text, color) = match result.outcome {
            TestOutcome::Pass => ("PASS", Color::Green),
            TestOutcome::Fail(_) => ("FAIL", Color::Red),
        };
        let label = result.description.clone().unwrap_or_else(|| {
            let name = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("?");
            name.trim_end_matches(TEST_SUFFIX).to_string()
        });
        let _ = write!(self.out, "  ");
        self.styled(text, ColorSpec::new().set_fg(Some(color)));
        let _ = writeln!(self.out, "  {}", label);
    }

    fn failures(&mut self, failures: &[&TestResult]) {
        if failures.is_empty() {
            return;
        }
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "failures:");
        for failure in failures {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    let _ = writeln!(self.out, "  {}", line);
                }
            }
        }
    }

    fn summary(&mut self, passed: usize, failed: usize) {
        let _ = writeln!(self.out);
        let _ = write!(self.out, "test result: ");
        if failed == 0 {
            self.styled("ok", ColorSpec::new().set_fg(Some(Color::Green)));
            let _ = writeln!(self.out, ". {} passed, 0 failed", passed);
        } else {
            self.styled("FAILED", ColorSpec::new().set_fg(Some(Color::Red)));
            let _ = writeln!(
                self.out,
                ". {} passed, {} failed (of {})",
                passed,
                failed,
                passed + failed
            );
        }
    }
}

/// Run all `.test.hcl` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let single;
    let all_categories;
    let selected: BTreeMap<&str, &[PathBuf]> = if path.is_file() {
        // Single file mode ignores categories
        single = [path.to_path_buf()];
        BTreeMap::from([("", single.as_slice())])
    } else {
        all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no {} files found in {}", TEST_SUFFIX, path.display());
            return 1;
        }
        select_categories(&all_categories, categories)
    };

    if selected.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut reporter = Reporter::new(no_color);
    let mut results = Vec::new();
    for (category, files) in &selected {
        if !path.is_file() {
            reporter.heading(category_label(category));
        }
        for file in *files {
            let result = run_single_test(file);
            reporter.status(&result);
            results.push(result);
        }
    }

    let failures: Vec<&TestResult> = results
        .iter()
        .filter(|r| matches!(r.outcome, TestOutcome::Fail(_)))
        .collect();
    reporter.failures(&failures);
    reporter.summary(results.len() - failures.len(), failures.len());

    if failures.is_empty() { 0 } else { 1 }
}
