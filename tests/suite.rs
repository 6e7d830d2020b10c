use gherkin_suite::{
    gherkin,
    host::Status,
    step::DocString,
    Context, Options, Recorder, StepTest, Suite,
};

fn init_tracing() {
    _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn counter(ctx: &Context) -> i64 {
    ctx.get_i64_or(&"counter", 0).unwrap()
}

fn suite(options: Options) -> Suite {
    let mut suite = Suite::new(options);

    suite
        .add_step(r"I add (\d+) and (\d+)", |_, ctx, (a, b): (i64, i64)| {
            ctx.set("sumRes", a + b);
        })
        .unwrap();
    suite
        .add_step(
            r"the result should equal (\d+)",
            |t: &mut StepTest, ctx: &mut Context, (want,): (i64,)| {
                let got = ctx.get_i64(&"sumRes").unwrap();
                if got != want {
                    t.error(format!("expected {want}, got {got}"));
                }
            },
        )
        .unwrap();
    suite
        .add_step("I use word {word}", |_, ctx, (word,): (String,)| {
            ctx.set("word", word);
        })
        .unwrap();
    suite
        .add_step(
            "the word should be {word}",
            |_, ctx, (want,): (String,)| -> anyhow::Result<()> {
                let got = ctx.get_string(&"word")?;
                anyhow::ensure!(got == want, "expected {want}, got {got}");
                Ok(())
            },
        )
        .unwrap();

    suite
        .add_step("there are <start> cucumbers", |_, ctx, (n,): (i64,)| {
            ctx.set("cucumbers", n);
        })
        .unwrap();
    suite
        .add_step("I eat <eat> cucumbers", |_, ctx, (n,): (i64,)| {
            let left = ctx.get_i64(&"cucumbers").unwrap() - n;
            ctx.set("cucumbers", left);
        })
        .unwrap();
    suite
        .add_step("I should have <left> cucumbers", |t, ctx, (n,): (i64,)| {
            if ctx.get_i64(&"cucumbers") != Ok(n) {
                t.fatal("wrong number of cucumbers");
            }
        })
        .unwrap();

    suite
        .add_step("the counter is reset", |_, ctx, (): ()| {
            ctx.set("counter", 0_i64);
        })
        .unwrap();
    suite
        .add_step("I increment the counter", |_, ctx, (): ()| {
            let next = counter(ctx) + 1;
            ctx.set("counter", next);
        })
        .unwrap();
    suite
        .add_step(r"the counter should be (\d+)", |t, ctx, (n,): (i64,)| {
            if counter(ctx) != n {
                t.error(format!("counter is {}", counter(ctx)));
            }
        })
        .unwrap();

    suite
        .add_step("the following text", |_, ctx, (doc,): (DocString,)| {
            ctx.set("text", doc.trim().to_owned());
        })
        .unwrap();
    suite
        .add_step(r"the text should have (\d+) characters", |t, ctx, (n,): (i64,)| {
            let len = ctx.get_string(&"text").unwrap().chars().count();
            if i64::try_from(len).unwrap() != n {
                t.error(format!("text has {len} characters"));
            }
        })
        .unwrap();
    suite
        .add_step("the people", |t, ctx, (table,): (gherkin::Table,)| {
            t.log(format!("{} rows", table.rows.len()));
            ctx.set("people", i64::try_from(table.rows.len() - 1).unwrap());
        })
        .unwrap();
    suite
        .add_step(r"there should be (\d+) people", |_, ctx, (n,): (i64,)| {
            assert_eq!(ctx.get_i64(&"people"), Ok(n));
        })
        .unwrap();

    suite
}

fn options() -> Options {
    Options::new()
        .with_source("tests/features/*.feature")
        .with_ignored_tags(["@wip", "ignored"])
}

#[test]
fn runs_features() {
    init_tracing();

    let mut host = Recorder::new("features");
    let summary = suite(options()).run(&mut host);

    assert!(!summary.failed(), "{summary}");
    assert!(!host.failed());
    assert_eq!(summary.features.passed, 5);
    assert_eq!(summary.scenarios.passed, 10);
    assert_eq!(summary.scenarios.skipped, 1);
    assert_eq!(summary.steps.passed, 25);
    assert_eq!(summary.rules, 1);

    let add = host.at(&["Adding", "add two digits"]).unwrap();
    assert_eq!(
        add.children().iter().map(Recorder::name).collect::<Vec<_>>(),
        vec!["I add 1 and 4", "the result should equal 5"],
    );
    assert_eq!(
        host.at(&["Adding", "pick a word", "I use word pizza"])
            .unwrap()
            .status(),
        Status::Passed,
    );
}

#[test]
fn expands_outline_rows() {
    let mut host = Recorder::new("features");
    let mut suite = suite(options());
    _ = suite.run(&mut host);

    let outline = host.at(&["Hungry", "eating <eat>"]).unwrap();
    assert_eq!(
        outline
            .children()
            .iter()
            .map(Recorder::name)
            .collect::<Vec<_>>(),
        vec!["eating 5", "eating 4", "eating 3"],
    );
    assert!(outline.children().iter().all(|r| r.children().len() == 3));
    assert!(!outline.failed());

    let patterns = suite
        .registry()
        .bindings()
        .iter()
        .map(|b| b.pattern().as_str().to_owned())
        .collect::<Vec<_>>();
    assert!(patterns.contains(&r"there are (\d+) cucumbers".to_owned()));
    assert!(patterns.contains(&r"I eat (\d+) cucumbers".to_owned()));
}

#[test]
fn outline_rows_start_with_fresh_context() {
    let mut suite = Suite::new(
        Options::new().with_source("tests/features/outline/isolation.feature"),
    );
    suite
        .add_step("^nothing is remembered$", |t, ctx, (): ()| {
            if ctx.contains(&"remembered") {
                t.error("context leaked from a previous row");
            }
        })
        .unwrap();
    suite
        .add_step("^I remember <row>$", |_, ctx, (row,): (i64,)| {
            ctx.set("remembered", row);
        })
        .unwrap();
    suite
        .add_step(r"^I remember exactly (\d+)$", |t, ctx, (row,): (i64,)| {
            if ctx.get_i64(&"remembered") != Ok(row) {
                t.error("wrong row remembered");
            }
        })
        .unwrap();

    let mut host = Recorder::new("isolation");
    let summary = suite.run(&mut host);

    assert!(!summary.failed(), "{summary}");
    assert_eq!(summary.scenarios.passed, 2);
    assert_eq!(summary.steps.passed, 6);
    let outline = host.at(&["Isolated rows", "row <row>"]).unwrap();
    assert_eq!(
        outline
            .children()
            .iter()
            .map(Recorder::name)
            .collect::<Vec<_>>(),
        vec!["row 1", "row 2"],
    );
}

#[test]
fn runs_backgrounds_and_rules() {
    let mut host = Recorder::new("features");
    _ = suite(options()).run(&mut host);

    let feature = host.child("Backgrounds and rules").unwrap();
    assert_eq!(
        feature
            .at(&["feature background only"])
            .unwrap()
            .children()
            .iter()
            .map(Recorder::name)
            .collect::<Vec<_>>(),
        vec![
            "the counter is reset",
            "I increment the counter",
            "the counter should be 1",
        ],
    );
    assert_eq!(
        feature
            .at(&["with its own background", "both backgrounds"])
            .unwrap()
            .children()
            .len(),
        4,
    );
    assert!(!feature.failed());

    let wip = feature.child("unfinished").unwrap();
    assert!(wip.skipped());
    assert!(wip.children().is_empty());
}

#[test]
fn skips_by_tags() {
    let mut host = Recorder::new("features");
    _ = suite(options()).run(&mut host);

    assert!(host.at(&["Tags", "is skipped"]).unwrap().skipped());
    assert_eq!(
        host.at(&["Tags", "runs"]).unwrap().status(),
        Status::Passed,
    );

    let mut host = Recorder::new("features");
    let summary = suite(options().with_ignored_tags(["tagged", "empty"]))
        .run(&mut host);
    assert!(host.child("Tags").unwrap().skipped());
    assert_eq!(summary.features.skipped, 1);
    assert!(host
        .at(&["Hungry", "eating <eat>", "eating 3"])
        .unwrap()
        .skipped());

    let mut host = Recorder::new("features");
    let summary = suite(options().with_tags(["tagged"])).run(&mut host);
    assert!(!summary.failed());
    assert_eq!(summary.scenarios.passed, 1);
    assert!(host.at(&["Adding", "add two digits"]).unwrap().skipped());
}

#[test]
fn filters_by_tag_expression() {
    let mut host = Recorder::new("features");
    let summary = suite(
        Options::new()
            .with_source("tests/features/hungry.feature")
            .with_tag_expression("not @empty".parse().unwrap()),
    )
    .run(&mut host);

    assert_eq!(summary.scenarios.passed, 2);
    assert_eq!(summary.scenarios.skipped, 1);
}

#[test]
fn passes_attachments() {
    let mut host = Recorder::new("features");
    _ = suite(options()).run(&mut host);

    let table = host
        .at(&["Attachments", "data table", "the people"])
        .unwrap();
    assert_eq!(table.logs(), ["3 rows".to_owned()]);
    assert!(!host.child("Attachments").unwrap().failed());
}

#[test]
fn parallel_run_matches_sequential() {
    let mut sequential = Recorder::new("features");
    let expected = suite(options()).run(&mut sequential);

    let mut parallel = Recorder::new("features");
    let summary = suite(options().run_in_parallel()).run(&mut parallel);

    assert_eq!(summary.steps, expected.steps);
    assert_eq!(summary.scenarios, expected.scenarios);
    assert_eq!(summary.features, expected.features);
    assert_eq!(
        parallel
            .children()
            .iter()
            .map(Recorder::name)
            .collect::<Vec<_>>(),
        sequential
            .children()
            .iter()
            .map(Recorder::name)
            .collect::<Vec<_>>(),
    );
    assert!(parallel.children().iter().all(Recorder::is_parallel));
    assert!(!parallel.failed());
}

#[test]
fn hooks_run_in_order() {
    use std::sync::{Arc, Mutex};

    let log = Arc::new(Mutex::new(Vec::new()));
    let hook = |name: &'static str| {
        let log = Arc::clone(&log);
        move |_: &mut Context| log.lock().unwrap().push(name)
    };

    let options = Options::new()
        .with_source("tests/features/add.feature")
        .with_before_scenario(hook("before scenario 1"))
        .with_before_scenario(hook("before scenario 2"))
        .with_after_scenario(hook("after scenario"))
        .with_before_step(hook("before step"))
        .with_after_step(hook("after step"));
    let summary = suite(options).run(&mut Recorder::new("hooks"));
    assert!(!summary.failed());

    let log = log.lock().unwrap();
    assert_eq!(
        log[..6],
        [
            "before scenario 1",
            "before scenario 2",
            "before step",
            "after step",
            "before step",
            "after step",
        ],
    );
    assert_eq!(log[6], "after scenario");
    assert_eq!(log.len(), 14);
}

#[test]
fn raw_steps_receive_untyped_arguments() {
    use gherkin_suite::{
        source::Virtual,
        step::{Arg, Kind},
    };

    let features = Virtual::new().file(
        "raw.feature",
        "\
Feature: Raw
  Scenario: shout
    When I shout hello 3 times
",
    );
    let mut suite = Suite::new(Options::new().with_source(features));
    suite
        .add_raw_step(
            r"I shout (\w+) (\d+) times",
            vec![Kind::String, Kind::I8],
            |t, ctx, args| match args.as_slice() {
                [Arg::String(word), Arg::I8(n)] => {
                    t.log(word.repeat(usize::try_from(*n)?));
                    ctx.set("shouted", true);
                    Ok(())
                }
                _ => anyhow::bail!("unexpected arguments: {args:?}"),
            },
        )
        .unwrap();

    let mut host = Recorder::new("raw");
    let summary = suite.run(&mut host);

    assert!(!summary.failed(), "{summary}");
    assert_eq!(
        host.at(&["Raw", "shout", "I shout hello 3 times"])
            .unwrap()
            .logs(),
        ["hellohellohello".to_owned()],
    );
}
