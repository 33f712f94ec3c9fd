//! Serializes the live state of a [`Form`] into its value line.
//!
//! Body rows are walked depth first. Every field that produces a value contributes one
//! entry; containers join their children with the form separator and disappear when
//! none of their children produced anything.

use super::{
    date,
    model::{CheckMode, Field, FieldKind, Form, Item, ListField, PrintValues, Row, Selection, TabBar},
};

struct Context<'a> {
    separator: &'a str,
    list_row_separator: &'a str,
    date_format: Option<&'a str>,
}

/// Returns one entry per body row that produced a value.
pub fn collect(form: &Form) -> Vec<String> {
    let ctx = Context {
        separator: &form.settings.separator,
        list_row_separator: &form.settings.list_row_separator,
        date_format: form.settings.date_format.as_deref(),
    };
    form.rows.iter().filter_map(|row| row_value(row, &ctx)).collect()
}

/// The line printed when the form is accepted.
pub fn print_line(form: &Form, prefix: &str) -> String {
    format!("{prefix}{}", collect(form).join(&form.settings.separator))
}

fn row_value(row: &Row, ctx: &Context) -> Option<String> {
    match &row.item {
        Item::Field(field) => field_value(field, ctx),
        Item::Group(group) => join_rows(&group.rows, ctx),
        Item::Columns(cols) => {
            let values: Vec<String> = [&cols.left.field, &cols.right.field]
                .into_iter()
                .filter_map(|f| field_value(f, ctx))
                .collect();
            (!values.is_empty()).then(|| values.join(ctx.separator))
        }
        Item::Tabs(bar) => tabs_value(bar, ctx),
    }
}

fn join_rows(rows: &[Row], ctx: &Context) -> Option<String> {
    let values: Vec<String> = rows.iter().filter_map(|row| row_value(row, ctx)).collect();
    (!values.is_empty()).then(|| values.join(ctx.separator))
}

fn tabs_value(bar: &TabBar, ctx: &Context) -> Option<String> {
    let mut parts = Vec::new();

    for (i, tab) in bar.tabs.iter().enumerate() {
        let Some(body) = join_rows(&tab.rows, ctx) else {
            continue;
        };
        if bar.verbose {
            let mark = if i == bar.current { "*" } else { "" };
            let name = &tab.name;
            parts.push(format!(
                "<TAB_START{mark}>{name}</TAB_START{mark}>{body}<TAB_END{mark}>{name}</TAB_END{mark}>"
            ));
        } else {
            parts.push(body);
        }
    }

    (!parts.is_empty()).then(|| parts.join(ctx.separator))
}

fn field_value(field: &Field, ctx: &Context) -> Option<String> {
    if field.meta.hidden {
        return None;
    }

    let value = match &field.kind {
        FieldKind::Entry { text, .. } => text.clone(),
        FieldKind::FileSelection(sel) => sel.path.clone(),
        FieldKind::Combo(combo) => combo.current_text().to_string(),
        FieldKind::Checkbox { checked, .. } => checked.to_string(),
        FieldKind::Scale(scale) => scale.value.to_string(),
        FieldKind::SpinBox(spin) => spin.value_text(),
        FieldKind::Calendar { date } => date::format_date(*date, ctx.date_format),
        FieldKind::List(list) => {
            if field.meta.exclude_from_output {
                return None;
            }
            list_value(list, ctx)?
        }
        FieldKind::TextInfo(info) if info.editable && !info.browser => {
            let text = info.plain_text();
            match info.newline_separator.as_deref() {
                Some(sep) if !sep.is_empty() => text.replace('\n', sep),
                _ => text,
            }
        }
        _ => return None,
    };

    Some(var_prefix(field) + &value)
}

fn var_prefix(field: &Field) -> String {
    let var: String = field
        .meta
        .var
        .as_deref()
        .unwrap_or("")
        .split_whitespace()
        .collect();
    if var.is_empty() { var } else { var + "=" }
}

fn list_value(list: &ListField, ctx: &Context) -> Option<String> {
    if list.selection == Selection::None {
        return None;
    }

    let checkable = list.check_mode != CheckMode::Off;
    let print_all = list.print_values == PrintValues::All;

    let rows: Vec<String> = list
        .rows
        .iter()
        .enumerate()
        .filter(|&(i, _)| {
            let checked = list.checked.get(i).copied().unwrap_or(false);
            let selected = list.selected.get(i).copied().unwrap_or(false);
            print_all || if checkable { checked } else { selected }
        })
        .map(|(i, row)| list_row(list, i, row, checkable))
        .collect();

    Some(rows.join(ctx.list_row_separator))
}

/// The printed columns of one row. Every printed column after the first one of the
/// list starts with `,`, even when it is the only column printed.
fn list_row(list: &ListField, index: usize, row: &[String], checkable: bool) -> String {
    let mut out = String::new();
    for c in (0..list.column_count()).filter(|&c| list.print_column.includes(c)) {
        if c > 0 {
            out.push(',');
        }
        if checkable && c == 0 {
            out.push_str(if list.checked.get(index).copied().unwrap_or(false) { "true" } else { "false" });
        } else {
            out.push_str(row.get(c).map(String::as_str).unwrap_or(""));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::forms::{FormArg, compile};

    fn form(list: &[&str]) -> Form {
        compile(list.iter().map(|a| {
            let a = a.trim_start_matches("--");
            match a.split_once('=') {
                Some((name, value)) => FormArg::new(name, Some(value)),
                None => FormArg::new(a, None),
            }
        }))
    }

    fn set_entries(form: &mut Form, values: &[&str]) {
        let mut values = values.iter();
        form.for_each_field_mut(&mut |field| {
            if let FieldKind::Entry { text, .. } = &mut field.kind {
                if let Some(v) = values.next() {
                    *text = v.to_string();
                }
            }
        });
    }

    #[test]
    fn entries_and_vars() {
        let mut f = form(&["--add-entry=Name", "--var=full name", "--add-password=Pw", "--add-checkbox=Ok"]);
        set_entries(&mut f, &["Ada", "secret"]);
        assert_eq!(print_line(&f, ""), "fullname=Ada|secret|false");
    }

    #[test]
    fn hidden_and_decorations_are_skipped() {
        let mut f = form(&[
            "--add-text=Intro",
            "--add-entry=A",
            "--hide",
            "--add-hrule=#ccc",
            "--add-entry=B",
            "--add-qr-code=hello",
        ]);
        set_entries(&mut f, &["x", "y"]);
        assert_eq!(collect(&f), vec!["y"]);
    }

    #[test]
    fn spin_and_scale() {
        let f = form(&[
            "--add-double-spin-box=Price",
            "--decimals=3",
            "--value=2.5",
            "--add-spin-box=Qty",
            "--value=4",
            "--add-scale=Vol",
            "--value=70",
        ]);
        assert_eq!(print_line(&f, "ok:"), "ok:2.5|4|70");
    }

    #[test]
    fn calendar_uses_date_format() {
        let mut f = form(&["--forms-date-format=dd/MM/yyyy", "--add-calendar=Day"]);
        f.for_each_field_mut(&mut |field| {
            if let FieldKind::Calendar { date } = &mut field.kind {
                *date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
            }
        });
        assert_eq!(collect(&f), vec!["29/02/2024"]);
    }

    #[test]
    fn list_selected_rows() {
        let mut f = form(&[
            "--list-row-separator=;",
            "--add-list=Files",
            "--column-values=Name|Size",
            "--multiple",
            "--print-column=all",
            "--list-values=a|1|b|2|c|3",
        ]);
        f.for_each_field_mut(&mut |field| {
            if let FieldKind::List(list) = &mut field.kind {
                list.select(0, false);
                list.select(2, true);
            }
        });
        assert_eq!(collect(&f), vec!["a,1;c,3"]);
    }

    #[test]
    fn checklist_prints_checked_rows() {
        let f = form(&[
            "--add-list=Pick",
            "--column-values=|Item|Price",
            "--checklist",
            "--print-column=all",
            "--list-values=true|apple|1|false|pear|2|TRUE|fig|3",
        ]);
        assert_eq!(collect(&f), vec!["true,apple,1~true,fig,3"]);
    }

    #[test]
    fn later_printed_columns_keep_their_comma() {
        let f = form(&[
            "--add-list=Pick",
            "--column-values=|Item",
            "--radiolist",
            "--print-column=2",
            "--print-values=all",
            "--list-values=false|apple|true|pear",
        ]);
        assert_eq!(collect(&f), vec![",apple~,pear"]);
    }

    #[test]
    fn excluded_and_unselectable_lists() {
        let f = form(&[
            "--add-list=excludeFromOutput=1@A",
            "--list-values=x",
            "--add-list=B",
            "--no-selection",
            "--list-values=y",
            "--add-entry=C",
        ]);
        assert_eq!(collect(&f), vec![""]);
    }

    #[test]
    fn empty_selection_still_prints() {
        let f = form(&["--add-list=A", "--list-values=x|y", "--add-entry=B"]);
        assert_eq!(print_line(&f, ""), "|");
    }

    #[test]
    fn verbose_tabs() {
        let mut f = form(&[
            "--tab=verboseTabBar=1@One",
            "--add-entry=A",
            "--tab=Two",
            "--add-text=nothing here",
            "--tab=Three",
            "--add-entry=B",
            "--add-entry=C",
            "--tab-visible",
        ]);
        set_entries(&mut f, &["a", "b", "c"]);
        assert_eq!(
            print_line(&f, ""),
            "<TAB_START>One</TAB_START>a<TAB_END>One</TAB_END>|<TAB_START*>Three</TAB_START*>b|c<TAB_END*>Three</TAB_END*>"
        );
    }

    #[test]
    fn empty_containers_vanish() {
        let mut f = form(&[
            "--group=G",
            "--add-text=only text",
            "--group=stop=1",
            "--col1",
            "--add-entry=L",
            "--col2",
            "--add-entry=R",
        ]);
        set_entries(&mut f, &["l", "r"]);
        assert_eq!(collect(&f), vec!["l|r"]);
    }

    #[test]
    fn header_is_not_printed() {
        let mut f = form(&["--header=Top", "--add-entry=H", "--header=stop=1", "--add-entry=B"]);
        set_entries(&mut f, &["header", "body"]);
        assert_eq!(collect(&f), vec!["body"]);
    }

    #[test]
    fn editable_text_info() {
        let mut f = form(&["--add-text-info=Notes", "--editable", "--newline-separator=\\n", "--add-text-info=RO"]);
        f.for_each_field_mut(&mut |field| {
            if let FieldKind::TextInfo(info) = &mut field.kind {
                info.text = "one\ntwo".into();
            }
        });
        assert_eq!(collect(&f), vec!["one\\ntwo"]);
    }
}
