use std::{
    fs::{self, File},
    path::Path,
    thread,
    time::{Duration, SystemTime},
};

use guid::forms::{
    self, FormArg,
    footer::Footer,
    model::{FieldKind, Form},
    source::FileMonitor,
};

/// Rewrites `path` and pushes its mtime forward so coarse timestamps still change.
fn rewrite(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();
}

fn shown_text(form: &Form) -> String {
    match &form.fields()[0].kind {
        FieldKind::Text(text) => text.text.clone(),
        other => panic!("expected a text widget, got {other:?}"),
    }
}

#[test]
fn monitored_combo_follows_its_file() {
    let dir = tempfile::tempdir().unwrap();
    let values = dir.path().join("sizes.txt");
    fs::write(&values, "small\nmedium\n").unwrap();

    let mut form = forms::compile([
        FormArg::new("add-combo", Some("Size")),
        FormArg::new("combo-values-from-file", Some(&format!("monitor=1@{}", values.display()))),
    ]);
    assert_eq!(forms::collect(&form), vec!["small"]);
    assert_eq!(form.monitored_paths(), vec![values.clone()]);

    let mut monitor = FileMonitor::new();
    for path in form.monitored_paths() {
        monitor.watch(&path);
    }
    assert!(monitor.poll().is_empty());

    rewrite(&values, "large\nhuge\n");
    let changed = monitor.poll();
    assert_eq!(changed, vec![values.clone()]);
    assert!(form.reload_sources(&values));
    assert_eq!(forms::collect(&form), vec!["large"]);
}

#[test]
fn list_values_from_file_use_the_given_separator() {
    let dir = tempfile::tempdir().unwrap();
    let values = dir.path().join("rows.txt");
    fs::write(&values, "a;b\nc;d\n").unwrap();

    let form = forms::compile([
        FormArg::new("add-list", Some("Rows")),
        FormArg::new("column-values", Some("One|Two")),
        FormArg::new("print-values", Some("all")),
        FormArg::new("list-values-from-file", Some(&format!("sep=;@{}", values.display()))),
    ]);
    assert_eq!(forms::collect(&form), vec!["a~c"]);
}

#[test]
fn footer_file_keeps_the_top_entries() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("footer.log");
    fs::write(&log, "one\ntwo\nthree\nfour\n").unwrap();

    let mut footer = Footer::new(2);
    assert!(footer.load(&log));
    assert_eq!(footer.entries().collect::<Vec<_>>(), vec!["one", "two"]);

    footer.push("five");
    assert_eq!(footer.entries().collect::<Vec<_>>(), vec!["five", "one"]);
}

#[test]
fn unreadable_sources_leave_widgets_empty() {
    let form = forms::compile([
        FormArg::new("add-combo", Some("Pick")),
        FormArg::new("combo-values-from-file", Some("/nonexistent/guid/values")),
    ]);
    assert_eq!(forms::collect(&form), vec![""]);
}

#[test]
fn text_marker_reads_the_named_variable() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("status");
    fs::write(&status, "mem=512=MiB\ncpu=42\n").unwrap();

    let mut form = forms::compile([FormArg::new(
        "add-text",
        Some(&format!(
            "monitorMarkerFile1={}@monitorVarName1=cpu@CPU: GUID_MARKER_1%",
            status.display()
        )),
    )]);
    assert_eq!(shown_text(&form), "CPU: 42%");
    assert_eq!(form.monitored_paths(), vec![status.clone()]);

    rewrite(&status, "cpu=7\n");
    assert!(form.reload_sources(&status));
    assert_eq!(shown_text(&form), "CPU: 7%");
}

#[test]
fn empty_marker_value_shows_the_default() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("status");
    fs::write(&status, "").unwrap();

    let form = forms::compile([FormArg::new(
        "add-text",
        Some(&format!(
            "monitorMarkerFile1={}@defMarkerVal1=n/a@Load: GUID_MARKER_1",
            status.display()
        )),
    )]);
    assert_eq!(shown_text(&form), "Load: n/a");
}

#[test]
fn marker_without_default_shows_a_question_mark() {
    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("status");
    fs::write(&status, "other=1\n").unwrap();

    let form = forms::compile([FormArg::new(
        "add-text",
        Some(&format!(
            "monitorMarkerFile1={}@monitorVarName1=cpu@CPU: GUID_MARKER_1",
            status.display()
        )),
    )]);
    assert_eq!(shown_text(&form), "CPU: (?)");
}

#[test]
fn recreated_file_is_reported_as_changed() {
    let dir = tempfile::tempdir().unwrap();
    let values = dir.path().join("values.txt");
    fs::write(&values, "old\n").unwrap();

    let mut monitor = FileMonitor::new();
    monitor.watch(&values);
    assert!(!monitor.is_empty());

    fs::remove_file(&values).unwrap();
    let staged = dir.path().join("values.staged");
    rewrite(&staged, "new\n");
    let writer = {
        let values = values.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            fs::rename(&staged, &values).unwrap();
        })
    };

    assert_eq!(monitor.poll(), vec![values.clone()]);
    writer.join().unwrap();
    assert_eq!(fs::read_to_string(&values).unwrap(), "new\n");
}

#[test]
fn removed_file_is_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    let values = dir.path().join("values.txt");
    fs::write(&values, "old\n").unwrap();

    let mut monitor = FileMonitor::new();
    monitor.watch(&values);
    fs::remove_file(&values).unwrap();
    assert!(monitor.poll().is_empty());
}
