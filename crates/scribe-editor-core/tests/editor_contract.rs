// Contract tests for the editor component, driven only through its public API:
// value/on-change synchronization, toolbar commands, the link dialog, Enter
// handling, history and the canonical HTML it emits.

use std::cell::RefCell;
use std::rc::Rc;

use scribe_editor_core::html::{Token, Tokenizer, is_void_element};
use scribe_editor_core::{
    InputType, Key, KeyCombo, KeydownResult, LinkDialog, MarkKind, RichDocument, RichTextEditor,
    Selection, ToolbarCommand,
};

type Changes = Rc<RefCell<Vec<String>>>;

fn mount(value: &str) -> (RichTextEditor, Changes) {
    let changes: Changes = Rc::new(RefCell::new(Vec::new()));
    let mut editor = RichTextEditor::default();
    render(&mut editor, value, &changes);
    (editor, changes)
}

fn render(editor: &mut RichTextEditor, value: &str, changes: &Changes) {
    let sink = changes.clone();
    editor.render(
        value,
        move |html| sink.borrow_mut().push(html.to_string()),
        "Start writing...",
    );
}

/// Every start tag is closed in order and every end tag matches.
fn is_well_formed(html: &str) -> bool {
    let mut stack = Vec::new();
    for token in Tokenizer::new(html) {
        match token {
            Token::StartTag {
                name, self_closing, ..
            } => {
                if !self_closing && !is_void_element(&name) {
                    stack.push(name);
                }
            }
            Token::EndTag { name } => {
                if stack.pop() != Some(name) {
                    return false;
                }
            }
            _ => {}
        }
    }
    stack.is_empty()
}

#[test]
fn test_insert_link_wraps_exact_selection() {
    let selections = [(0, 4), (5, 9), (2, 7), (9, 0), (0, 13)];
    for (anchor, head) in selections {
        let (mut editor, changes) = mount("<p>some text here</p>");
        editor.select(Selection::new(anchor, head));
        assert!(editor.command(ToolbarCommand::InsertLink));
        editor.link_url_input("https://example.com/page");
        assert!(editor.confirm_link());

        assert_eq!(editor.link_dialog(), &LinkDialog::Closed);
        let doc = RichDocument::from_html(editor.html());
        let sel = Selection::new(anchor, head);
        let links: Vec<_> = doc.marks().iter().map(|span| span.range()).collect();
        assert_eq!(links, [sel.to_range()], "selection {anchor}..{head}");
        assert_eq!(changes.borrow().len(), 1);
    }
}

#[test]
fn test_link_dialog_needs_non_empty_selection() {
    let (mut editor, _) = mount("<p>text</p>");
    // never selected
    assert!(!editor.command(ToolbarCommand::InsertLink));
    assert!(!editor.link_dialog().is_open());

    editor.select(Selection::collapsed(2));
    assert!(!editor.command(ToolbarCommand::InsertLink));
    assert!(!editor.link_dialog().is_open());
    assert!(editor.view().link_dialog.is_none());
}

#[test]
fn test_empty_url_keeps_dialog_open() {
    let (mut editor, changes) = mount("<p>text</p>");
    editor.select(Selection::new(0, 4));
    editor.command(ToolbarCommand::InsertLink);

    assert!(!editor.confirm_link());
    assert!(editor.link_dialog().is_open());
    assert_eq!(editor.html(), "<p>text</p>");
    assert!(changes.borrow().is_empty());

    editor.link_url_input("https://example.com");
    editor.cancel_link();
    assert!(!editor.link_dialog().is_open());
    assert_eq!(editor.html(), "<p>text</p>");
}

#[test]
fn test_bold_toggle_twice_restores_formatting() {
    let documents = [
        "<p>plain text</p>",
        "<p><b>bold text</b></p>",
        "<h1>Head</h1><p><i>it</i> and <u>under</u></p>",
    ];
    for html in documents {
        let (mut editor, _) = mount(html);
        let original = editor.html().to_string();
        let len = editor.document().len_chars();
        editor.select(Selection::new(0, len));
        editor.command(ToolbarCommand::Bold);
        assert_ne!(editor.html(), original);
        editor.command(ToolbarCommand::Bold);
        assert_eq!(editor.html(), original, "for {html}");
    }
}

#[test]
fn test_external_value_applied_once() {
    let (mut editor, changes) = mount("<p>draft</p>");
    let value = "<h1>Loaded post</h1><p>body</p>";

    assert!(editor.sync_value(value));
    assert_eq!(editor.html(), value);
    // re-render with the same value changes nothing
    assert!(!editor.sync_value(value));
    render(&mut editor, value, &changes);
    assert_eq!(editor.html(), value);
    assert!(changes.borrow().is_empty());
}

#[test]
fn test_round_trip_through_parent_state() {
    // The parent stores every payload and renders it back.
    let (mut editor, changes) = mount("");
    editor.focus();
    editor.input(&InputType::InsertText, Some("Hello"));
    let latest = changes.borrow().last().cloned().unwrap_or_default();
    render(&mut editor, &latest, &changes);

    editor.select(Selection::new(0, 5));
    editor.command(ToolbarCommand::Bold);
    let latest = changes.borrow().last().cloned().unwrap_or_default();
    render(&mut editor, &latest, &changes);

    assert_eq!(editor.html(), "<p><b>Hello</b></p>");
    assert_eq!(changes.borrow().len(), 2);
}

#[test]
fn test_enter_inserts_paragraph_not_line_break() {
    let (mut editor, changes) = mount("<p>first second</p>");
    editor.select(Selection::collapsed(5));
    assert_eq!(
        editor.keydown(&KeyCombo::new(Key::Enter)),
        KeydownResult::Handled
    );
    assert_eq!(editor.html(), "<p>first</p><p> second</p>");
    assert!(!editor.html().contains("<br>"));
    assert_eq!(changes.borrow().len(), 1);
}

#[test]
fn test_every_payload_is_full_well_formed_content() {
    let (mut editor, changes) = mount("<p>Intro <b>bold <i>both</b> italic</i></p>");
    editor.select(Selection::new(2, 12));
    editor.command(ToolbarCommand::Underline);
    editor.command(ToolbarCommand::BulletList);
    editor.select(Selection::new(0, 6));
    editor.command(ToolbarCommand::InsertLink);
    editor.link_url_input("https://example.com/?q=<x>&y=\"z\"");
    editor.confirm_link();
    editor.select(Selection::collapsed(3));
    editor.keydown(&KeyCombo::new(Key::Enter));
    editor.input(&InputType::InsertText, Some("a < b & c"));
    editor.command(ToolbarCommand::Heading);
    editor.command(ToolbarCommand::RemoveLink);
    editor.input(&InputType::InsertFromPaste, Some("line one\nline two"));
    editor.input(&InputType::DeleteContentBackward, None);

    let payloads = changes.borrow();
    assert!(payloads.len() >= 6);
    for payload in payloads.iter() {
        assert!(is_well_formed(payload), "malformed payload: {payload}");
    }
    assert_eq!(payloads.last().map(String::as_str), Some(editor.html()));
}

#[test]
fn test_serialization_is_canonical() {
    let inputs = [
        "",
        "plain text",
        "<div>a<div>b</div></div>",
        "<p><b>x<i>y</b>z</i></p>",
        "<ul><li>one<ul><li>nested</li></ul></li></ul>",
        "<p>a&nbsp;&amp;&lt;b&gt;</p><p><br></p><p><br></p>",
        r#"<p><span style="text-decoration: underline">u</span><a href="javascript:alert(1)">js</a></p>"#,
        "<h4>h</h4><ol><li><b>1</b></li></ol><h1>t<br></h1>",
        "<p><br><br></p>",
        "<p>b<b> cd</b></p><ul><li><b><br></b><br></li></ul>",
        "<p>one<br>two<br><br></p>",
    ];
    for input in inputs {
        let once = RichDocument::from_html(input).to_html();
        let twice = RichDocument::from_html(&once).to_html();
        assert_eq!(twice, once, "for {input}");
        assert!(is_well_formed(&once), "{once}");
    }
}

#[test]
fn test_undo_restores_previous_html_and_redo_reapplies() {
    let (mut editor, _) = mount("<p>one two</p>");
    let mut snapshots = vec![editor.html().to_string()];

    editor.select(Selection::new(0, 3));
    editor.command(ToolbarCommand::Italic);
    snapshots.push(editor.html().to_string());
    editor.command(ToolbarCommand::NumberedList);
    snapshots.push(editor.html().to_string());
    editor.select(Selection::collapsed(7));
    editor.input(&InputType::InsertText, Some("!"));
    snapshots.push(editor.html().to_string());

    for expected in snapshots.iter().rev().skip(1) {
        assert!(editor.undo());
        assert_eq!(editor.html(), expected);
    }
    assert!(!editor.undo());

    for expected in snapshots.iter().skip(1) {
        assert!(editor.redo());
        assert_eq!(editor.html(), expected);
    }
    assert!(!editor.redo());
}

#[test]
fn test_soft_break_only_block_survives_reload() {
    let (mut editor, changes) = mount("<p>above</p><p><br></p>");
    editor.select(Selection::collapsed(6));
    editor.input(&InputType::InsertLineBreak, None);
    let payload = changes.borrow().last().cloned().unwrap_or_default();
    assert_eq!(payload, "<p>above</p><p><br><br></p>");

    let (reloaded, _) = mount(&payload);
    assert_eq!(reloaded.document(), editor.document());
    assert_eq!(reloaded.document().len_chars(), 7);
    assert_eq!(reloaded.html(), payload);
}

#[test]
fn test_typing_at_block_start_matches_toolbar() {
    let (mut editor, _) = mount("<p>plain</p><p><b>bold</b> tail</p>");
    // the second paragraph starts at 7 once the first gains a character
    for caret in [0, 7] {
        editor.select(Selection::collapsed(caret));
        let expected = editor.formatting().bold;
        editor.input(&InputType::InsertText, Some("x"));
        let doc = RichDocument::from_html(editor.html());
        assert_eq!(
            doc.mark_at(caret, MarkKind::Bold),
            expected,
            "caret {caret}: {}",
            editor.html()
        );
        assert_eq!(editor.formatting().bold, expected);
    }
    assert_eq!(editor.html(), "<p>xplain</p><p><b>xbold</b> tail</p>");
}

#[test]
fn test_focus_recomputes_formatting() {
    let (mut editor, _) = mount("<p>plain</p>");
    editor.select(Selection::new(0, 5));
    editor.blur();
    assert!(!editor.formatting().bold);

    editor.sync_value("<h1><b>plain</b></h1>");
    editor.focus();
    assert!(editor.is_focused());
    let state = editor.formatting();
    assert!(state.bold);
    assert!(state.heading);
}
