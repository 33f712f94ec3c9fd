use guid::{
    cli::{self, Command, GeneralOptions},
    forms::{
        self, FormArg,
        model::{FieldKind, Form},
    },
};

fn parse(args: &[&str]) -> (GeneralOptions, Vec<FormArg>) {
    match cli::parse_args(args) {
        Ok(Command::Forms {
            options,
            args,
        }) => (options, args),
        other => panic!("expected a forms command, got {other:?}"),
    }
}

fn type_entries(form: &mut Form, values: &[&str]) {
    let mut values = values.iter();
    for field in form.fields_mut() {
        if let FieldKind::Entry {
            text, ..
        } = &mut field.kind
        {
            if let Some(v) = values.next() {
                *text = v.to_string();
            }
        }
    }
}

#[test]
fn command_line_to_value_line() {
    let (options, args) = parse(&[
        "--forms",
        "--title=Signup",
        "--output-prefix-ok=>> ",
        "--separator=,",
        "--add-entry=Name",
        "--var=NAME",
        "--add-checkbox=Agree",
        "--checked",
        "--add-combo=Size",
        "--combo-values=S|M|L",
        "--add-scale=Volume",
        "--value=30",
    ]);
    assert_eq!(options.title.as_deref(), Some("Signup"));

    let mut form = forms::compile(args);
    type_entries(&mut form, &["Ada"]);
    assert_eq!(forms::print_line(&form, &options.output_prefix_ok), ">> NAME=Ada,true,S,30");
}

#[test]
fn groups_and_columns_join_like_rows() {
    let (_, args) = parse(&[
        "--forms",
        "--group=Address",
        "--add-entry=Street",
        "--add-entry=City",
        "--group=stop=1@",
        "--col1",
        "--add-entry=Left",
        "--col2",
        "--add-entry=Right",
    ]);
    let mut form = forms::compile(args);
    type_entries(&mut form, &["Main St", "Springfield", "l", "r"]);
    assert_eq!(forms::collect(&form), vec!["Main St|Springfield", "l|r"]);
}

#[test]
fn reset_restores_defaults_after_keep_open() {
    let (_, args) = parse(&[
        "--forms",
        "--action-after-ok-click=keepOpen=1@",
        "--add-entry=Name",
        "--add-spin-box=Count",
        "--value=3",
    ]);
    let mut form = forms::compile(args);
    assert!(form.settings.ok_action.keep_open);

    type_entries(&mut form, &["typed"]);
    for field in form.fields_mut() {
        if let FieldKind::SpinBox(spin) = &mut field.kind {
            spin.set_value(9.0);
        }
    }
    assert_eq!(forms::print_line(&form, ""), "typed|9");

    form.reset();
    assert_eq!(forms::print_line(&form, ""), "|3");
}

#[test]
fn ok_command_receives_the_prefixed_line() {
    let (options, args) = parse(&[
        "--forms",
        "--output-prefix-ok=OK: ",
        "--action-after-ok-click=command=notify-send<>GUID_VALUES@keepOpen=1@valuesToFooter=1",
        "--add-entry=Name",
        "--add-entry=City",
    ]);
    let mut form = forms::compile(args);
    type_entries(&mut form, &["Ada", "London"]);

    let line = forms::print_line(&form, &options.output_prefix_ok);
    assert_eq!(line, "OK: Ada|London");
    let action = &form.settings.ok_action;
    assert!(action.values_to_footer);
    assert_eq!(
        action.command_for(&line),
        Some(("notify-send".to_string(), vec!["OK: Ada|London".to_string()]))
    );
}

#[test]
fn other_dialog_types_are_rejected() {
    assert!(cli::parse_args(["--entry", "--text=Name"]).is_err());
    assert!(cli::parse_args(["--add-entry=Name"]).is_err());
}
