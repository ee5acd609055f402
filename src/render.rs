//! HTML fragments for server-rendered pages
//!
//! Renders candidate rows, committed selections and list editor rows the
//! way the host form expects them. Every interpolated value goes through
//! [`escape`].

use std::fmt::Write;

use crate::config::SelectionMode;
use crate::picker::list_editor::ListEditor;
use crate::picker::model::FormField;
use crate::picker::EntityPicker;

/// Escape text for use in element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn hidden_input(out: &mut String, name: &str, value: &str) {
    let _ = write!(
        out,
        r#"<input type="hidden" name="{}" value="{}"/>"#,
        escape(name),
        escape(value)
    );
}

/// One `<tr>` per candidate, in display order, with its select control
pub fn candidate_rows(picker: &EntityPicker) -> String {
    let config = picker.config();
    let input_type = match config.selection_mode {
        SelectionMode::Single => "radio",
        SelectionMode::Multiple => "checkbox",
    };
    let input_name = format!("{}-pick", config.field_name);

    let mut out = String::new();
    for candidate in picker.candidates() {
        out.push_str("<tr>");
        let _ = write!(out, "<td>{}</td>", escape(&candidate.title));
        for detail in &candidate.details {
            let _ = write!(out, "<td>{}</td>", escape(detail));
        }
        let id = candidate.id.to_string();
        let checked = if picker.is_checked(&candidate.id) {
            r#" checked="checked""#
        } else {
            ""
        };
        let _ = write!(
            out,
            r#"<td class="text-center"><input type="{}" name="{}" value="{}"{}/></td>"#,
            input_type,
            escape(&input_name),
            escape(&id),
            checked
        );
        out.push_str("</tr>");
    }
    out
}

/// Committed entries as removable list items carrying their hidden input
pub fn selection_items(picker: &EntityPicker) -> String {
    let field_name = &picker.config().field_name;
    let mut out = String::new();
    for entry in picker.selection().iter() {
        let id = escape(&entry.id.to_string());
        let _ = write!(
            out,
            r#"<li class="list-group-item selection-entry" data-id="{}">{}"#,
            id,
            escape(&entry.title)
        );
        if !entry.description.is_empty() {
            let _ = write!(out, " <small>{}</small>", escape(&entry.description));
        }
        hidden_input(&mut out, field_name, &entry.id.to_string());
        let _ = write!(
            out,
            r#"<button type="button" class="btn btn-danger btn-xs pull-right remove-selection" data-id="{}">&times;</button></li>"#,
            id
        );
    }
    out
}

/// List editor rows with one hidden input per cell
pub fn editor_rows(editor: &ListEditor) -> String {
    let mut out = String::new();
    for row in editor.rows() {
        let _ = write!(out, r#"<tr class="{}">"#, escape(editor.name()));
        for (column, cell) in editor.columns().iter().zip(&row.cells) {
            let _ = write!(out, "<td>{}", escape(&cell.display));
            hidden_input(&mut out, &column.field_name, &cell.value);
            out.push_str("</td>");
        }
        out.push_str(r#"<td><button type="button" class="btn btn-danger btn-xs remove-row">&times;</button></td></tr>"#);
    }
    out
}

/// Complete hidden part of the host form
pub fn host_form(
    action: &str,
    pickers: &[EntityPicker],
    editors: &[&ListEditor],
    csrf: Option<&FormField>,
) -> String {
    let mut out = String::new();
    let _ = write!(out, r#"<form method="post" action="{}">"#, escape(action));
    for picker in pickers {
        let _ = write!(
            out,
            r#"<ul class="list-group" data-picker="{}">{}</ul>"#,
            escape(picker.name()),
            selection_items(picker)
        );
    }
    for editor in editors {
        let _ = write!(out, "<table><tbody>{}</tbody></table>", editor_rows(editor));
    }
    if let Some(csrf) = csrf {
        hidden_input(&mut out, &csrf.name, &csrf.value);
    }
    out.push_str("</form>");
    out
}
