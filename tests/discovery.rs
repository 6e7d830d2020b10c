use std::{fs, path::Path};

use gherkin_suite::{
    reporter::{Basic, Coloring, Ext as _},
    source::Virtual,
    Options, Recorder, Suite,
};
use tempfile::TempDir;

fn suite(options: Options) -> Suite {
    let mut suite = Suite::new(options);
    suite
        .add_step(r"the counter should be (\d+)", |t, ctx, (n,): (i64,)| {
            let counter = ctx.get_i64_or(&"counter", 0).unwrap();
            if counter != n {
                t.error(format!("counter is {counter}"));
            }
        })
        .unwrap();
    suite
}

fn feature(name: &str) -> String {
    format!("Feature: {name}\n  Scenario: zero\n    Then the counter should be 0\n")
}

fn layout() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("top.feature"), feature("Top")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a feature").unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/deep.feature"), feature("Deep")).unwrap();
    dir
}

fn features_of(source: &Path) -> Vec<String> {
    let mut host = Recorder::new("discovery");
    let summary = suite(Options::new().with_source(source)).run(&mut host);
    assert!(!summary.failed(), "{summary}");
    host.children().iter().map(|r| r.name().to_owned()).collect()
}

#[test]
fn directory_includes_nested_files() {
    let dir = layout();

    assert_eq!(features_of(dir.path()), vec!["Deep", "Top"]);
}

#[test]
fn glob_stays_at_its_level() {
    let dir = layout();

    assert_eq!(features_of(&dir.path().join("*.feature")), vec!["Top"]);
    assert_eq!(
        features_of(&dir.path().join("nested/*.feature")),
        vec!["Deep"],
    );
}

#[test]
fn single_file() {
    let dir = layout();

    assert_eq!(
        features_of(&dir.path().join("nested/deep.feature")),
        vec!["Deep"],
    );
}

#[test]
fn missing_path_runs_nothing() {
    let dir = layout();

    assert!(features_of(&dir.path().join("absent/*.feature")).is_empty());
}

#[test]
fn virtual_patterns_select_files() {
    let fs = Virtual::new()
        .file("features/b.feature", feature("B"))
        .file("features/a.feature", feature("A"))
        .file("features/more/c.feature", feature("C"))
        .file("other/d.feature", feature("D"));

    let run = |fs: Virtual| {
        let mut host = Recorder::new("virtual");
        _ = suite(Options::new().with_source(fs)).run(&mut host);
        host.children()
            .iter()
            .map(|r| r.name().to_owned())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(fs.clone()), vec!["A", "B", "C", "D"]);
    assert_eq!(
        run(fs.clone().pattern("features/*.feature")),
        vec!["A", "B"],
    );
    assert_eq!(
        run(fs.clone().pattern("features/**/*.feature")),
        vec!["A", "B", "C"],
    );
    assert_eq!(
        run(fs.pattern("other/*").pattern("features/more/*")),
        vec!["C", "D"],
    );
}

#[test]
fn prints_outcomes_and_summary() {
    let fs = Virtual::new().file("top.feature", feature("Top")).file(
        "bad.feature",
        "\
Feature: Bad
  Scenario: one
    Then the counter should be 1
",
    );

    let mut reporter = Basic::new(Vec::new(), Coloring::Never).summarized();
    let summary = suite(Options::new().with_source(fs))
        .run_with(&mut Recorder::new("printed"), &mut reporter);
    assert!(summary.failed());
    assert_eq!(reporter.summary().scenarios, summary.scenarios);

    let out = String::from_utf8(reporter.into_inner().into_output()).unwrap();
    assert!(out.contains("Feature: Top"), "{out}");
    assert!(out.contains("Feature: Bad"), "{out}");
    assert!(out.contains("counter is 0"), "{out}");
    assert!(out.contains("[Summary]"), "{out}");
    assert!(out.contains("2 features (1 passed, 0 skipped, 1 failed)"), "{out}");
    assert!(out.contains("2 steps (1 passed, 0 skipped, 1 failed)"), "{out}");
}
