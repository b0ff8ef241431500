use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn hdoc() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("hdoc").expect("hdoc binary");
    cmd.arg("--no-color");
    cmd
}

fn cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../tests/cases")
}

#[test]
fn render_prints_html() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "div {\n  h1 {\n    innerText = \"Hi\"\n  }\n}\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .assert()
        .success()
        .stdout("<div><h1 innerText=\"Hi\"></h1></div>\n");
    Ok(())
}

#[test]
fn file_argument_is_shorthand_for_render() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "p { }\n")?;

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("hdoc")?;
    cmd.arg(&page)
        .arg("--no-color")
        .assert()
        .success()
        .stdout("<p></p>\n");
    Ok(())
}

#[test]
fn json_variables_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    let vars = dir.path().join("vars.json");
    fs::write(&page, "dynamic \"li\" {\n  for_each = items\n  innerText = for_each\n}\n")?;
    fs::write(&vars, r#"{ "items": ["a", "b"] }"#)?;

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--vars")
        .arg(&vars)
        .assert()
        .success()
        .stdout("<li innerText=\"a\"></li><li innerText=\"b\"></li>\n");
    Ok(())
}

#[test]
fn toml_variables_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    let vars = dir.path().join("vars.toml");
    fs::write(&page, "span { title = name }\n")?;
    fs::write(&vars, "name = \"Ada\"\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--vars")
        .arg(&vars)
        .assert()
        .success()
        .stdout("<span title=\"Ada\"></span>\n");
    Ok(())
}

#[test]
fn non_object_variables_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    let vars = dir.path().join("vars.json");
    fs::write(&page, "p { }\n")?;
    fs::write(&vars, "[1, 2]")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--vars")
        .arg(&vars)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be an object"));
    Ok(())
}

#[test]
fn parse_error_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("broken.hcl");
    fs::write(&page, "div {\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("unclosed block `div`"));
    Ok(())
}

#[test]
fn diagnostics_go_to_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "p {\n  title = missing\n}\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .assert()
        .success()
        .stdout("<p></p>\n")
        .stderr(predicate::str::contains("undefined variable: missing"));
    Ok(())
}

#[test]
fn check_and_list_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "ul {\n  dynamic \"li\" {\n    for_each = xs\n  }\n}\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--check")
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("parsed successfully"));

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--list-blocks")
        .assert()
        .success()
        .stdout("ul\n  dynamic \"li\"\n");
    Ok(())
}

#[test]
fn quiet_suppresses_html() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "p { }\n")?;

    hdoc()
        .arg("render")
        .arg(&page)
        .arg("--quiet")
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn rust_log_overrides_default_level() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let page = dir.path().join("page.hcl");
    fs::write(&page, "p { }\n")?;

    hdoc()
        .env_remove("RUST_LOG")
        .arg("render")
        .arg(&page)
        .assert()
        .success()
        .stderr(predicate::str::contains("appended element").not());

    hdoc()
        .env("RUST_LOG", "debug")
        .arg("render")
        .arg(&page)
        .assert()
        .success()
        .stderr(predicate::str::contains("appended element"));
    Ok(())
}

#[test]
fn fixture_suite_passes() {
    hdoc()
        .arg("test")
        .arg(cases_dir())
        .assert()
        .success()
        .stderr(predicate::str::contains("test result: ok."));
}

#[test]
fn failing_fixture_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("wrong.test.hcl"),
        "---\ndescription = \"wrong html\"\nexpect_html = '<h2></h2>'\n---\nh1 { }\n",
    )?;

    hdoc()
        .arg("test")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("FAIL  wrong html"))
        .stderr(predicate::str::contains("html mismatch"))
        .stderr(predicate::str::contains("test result: FAILED. 0 passed, 1 failed (of 1)"));
    Ok(())
}

#[test]
fn list_categories() {
    hdoc()
        .arg("test")
        .arg(cases_dir())
        .arg("--list-categories")
        .assert()
        .success()
        .stderr(predicate::str::contains("dynamic (3 tests)"))
        .stderr(predicate::str::contains("elements (4 tests)"))
        .stderr(predicate::str::contains("errors (6 tests)"));
}

#[test]
fn category_filter() {
    hdoc()
        .arg("test")
        .arg(cases_dir())
        .arg("--category")
        .arg("errors")
        .assert()
        .success()
        .stderr(predicate::str::contains("errors"))
        .stderr(predicate::str::contains("test result: ok. 6 passed, 0 failed"));
}
