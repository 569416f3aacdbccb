use selector_helper::{
    dom::{
        dom_model::{Document, Rect},
        escape::{css_escape, escape_attr_value},
    },
    error::{SelectorError, SnapshotError},
};

use crate::common::fixtures::{login_page, node, page_with};

mod common;

// =========================================================================
// Snapshot loading
// =========================================================================

#[test]
fn snapshot_keeps_page_metadata() {
    let doc = login_page();

    assert_eq!(doc.url.as_deref(), Some("https://shop.example.com/login"));
    assert_eq!(doc.title, "Sign in");
    assert_eq!(doc.scroll_y, 120.0);
    assert_eq!(doc.tag(doc.root()), Some("html"));
}

#[test]
fn snapshot_text_shorthand_becomes_first_child() {
    let doc = login_page();
    let link = node(&doc, "a");

    assert_eq!(doc.inner_text(link), "Forgot password?");
    assert_eq!(doc.rect(link), Rect::new(490.0, 70.0, 140.0, 18.0));
}

#[test]
fn text_root_is_rejected() {
    let err = Document::from_json(r#"{"dom": "just text"}"#).unwrap_err();
    assert!(matches!(err, SnapshotError::Json(_)));
}

#[test]
fn missing_snapshot_file_reports_path() {
    let err = Document::load("/definitely/not/here.json").unwrap_err();
    match err {
        SnapshotError::Io { path, .. } => assert!(path.contains("not/here.json")),
        other => panic!("unexpected error: {other}"),
    }
}

// =========================================================================
// Text
// =========================================================================

#[test]
fn inner_text_collapses_whitespace() {
    let doc = login_page();
    assert_eq!(doc.inner_text(node(&doc, "button")), "Sign in");
}

#[test]
fn inner_text_joins_inline_children_without_spaces() {
    let mut doc = Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let button = doc.append_element(body, "button", &[]);
    doc.append_text(button, "Log");
    let bold = doc.append_element(button, "b", &[]);
    doc.append_text(bold, "in");

    let list = doc.append_element(body, "ul", &[]);
    for item in ["One", "Two"] {
        let li = doc.append_element(list, "li", &[]);
        doc.append_text(li, item);
    }
    let para = doc.append_element(body, "p", &[]);
    doc.append_text(para, "line");
    doc.append_element(para, "br", &[]);
    doc.append_text(para, "break");

    assert_eq!(doc.inner_text(button), "Login");
    assert_eq!(doc.inner_text(list), "One Two");
    assert_eq!(doc.inner_text(para), "line break");
}

#[test]
fn inner_text_skips_script_and_style() {
    let doc = login_page();

    assert_eq!(doc.inner_text(node(&doc, "[data-cy=\"footer\"]")), "O'Brien & Co");
    assert_eq!(doc.inner_text(node(&doc, "head")), "Sign in");
}

// =========================================================================
// Tree navigation
// =========================================================================

#[test]
fn nth_of_type_counts_same_tag_siblings_only() {
    let doc = login_page();
    let labels = doc.query_selector_all("form > label").unwrap();
    let inputs = doc.query_selector_all("form > input").unwrap();

    assert_eq!(doc.nth_of_type(labels[1]), 2);
    assert_eq!(doc.nth_of_type(inputs[0]), 1);
    assert_eq!(doc.nth_of_type(node(&doc, "button")), 1);
}

#[test]
fn ancestors_are_nearest_first() {
    let doc = login_page();
    let button = node(&doc, "button");
    let tags: Vec<_> = doc
        .ancestors(button)
        .into_iter()
        .filter_map(|a| doc.tag(a))
        .collect();

    assert_eq!(tags, vec!["form", "body", "html"]);
}

#[test]
fn get_element_by_id_ignores_empty_ids() {
    let (doc, ids) = page_with(&[("div", &[("id", "")], ""), ("div", &[("id", "main")], "")]);

    assert_eq!(doc.get_element_by_id(""), None);
    assert_eq!(doc.get_element_by_id("main"), Some(ids[1]));
    assert_eq!(doc.id(ids[0]), None);
}

// =========================================================================
// Selector queries
// =========================================================================

#[test]
fn attribute_selectors_accept_quoted_and_bare_values() {
    let doc = login_page();
    let quoted = doc.query_selector_all("[name=\"password\"]").unwrap();
    let single = doc.query_selector_all("[name='password']").unwrap();
    let bare = doc.query_selector_all("[name=password]").unwrap();

    assert_eq!(quoted.len(), 1);
    assert_eq!(quoted, single);
    assert_eq!(quoted, bare);
    assert_eq!(doc.query_selector_all("input[placeholder]").unwrap().len(), 2);
}

#[test]
fn combinators_and_lists() {
    let doc = login_page();

    assert_eq!(doc.query_selector_all("body > input").unwrap().len(), 0);
    assert_eq!(doc.query_selector_all("body input").unwrap().len(), 2);
    assert_eq!(doc.query_selector_all("img, a").unwrap().len(), 2);
    assert_eq!(
        doc.query_selector_all("html > body > div:nth-of-type(2) > p").unwrap().len(),
        1
    );
}

#[test]
fn class_and_universal_selectors() {
    let doc = login_page();

    assert_eq!(doc.query_selector_all(".btn.btn-primary").unwrap().len(), 1);
    assert_eq!(doc.query_selector_all("div.card > *").unwrap().len(), 3);
}

#[test]
fn closest_is_inclusive() {
    let doc = login_page();
    let span = node(&doc, "span.icon");
    let button = node(&doc, "button");

    assert_eq!(doc.closest(span, "button, a").unwrap(), Some(button));
    assert_eq!(doc.closest(button, "button").unwrap(), Some(button));
    assert_eq!(doc.closest(span, "label").unwrap(), None);
}

#[test]
fn unsupported_syntax_is_an_error() {
    let doc = login_page();

    for selector in ["a:hover", "a ~ b", "[href^=\"/\"]", "div >", "#", "p:nth-of-type(0)"] {
        let err = doc.query_selector_all(selector).unwrap_err();
        assert!(
            matches!(err, SelectorError::Syntax { .. }),
            "{selector} gave {err:?}"
        );
    }
    assert_eq!(doc.query_selector_all("   ").unwrap_err(), SelectorError::Empty);
}

#[test]
fn invalid_selectors_are_never_unique() {
    let doc = login_page();

    assert!(!doc.is_unique("a:hover"));
    assert!(!doc.is_unique("input"));
    assert!(doc.is_unique("img"));
}

// =========================================================================
// Escaping
// =========================================================================

#[test]
fn css_escape_follows_cssom() {
    assert_eq!(css_escape("main"), "main");
    assert_eq!(css_escape("1abc"), "\\31 abc");
    assert_eq!(css_escape("-1x"), "-\\31 x");
    assert_eq!(css_escape("-"), "\\-");
    assert_eq!(css_escape("a:b.c"), "a\\:b\\.c");
    assert_eq!(css_escape("naïve"), "naïve");
}

#[test]
fn escaped_ids_resolve_to_their_element() {
    let awkward = ["form:email", "9lives", "a b", "x.y", "-2", "quote\"d"];
    let attrs: Vec<[(&str, &str); 1]> = awkward.iter().map(|id| [("id", *id)]).collect();
    let elements: Vec<(&str, &[(&str, &str)], &str)> =
        attrs.iter().map(|a| ("div", a.as_slice(), "")).collect();
    let (doc, ids) = page_with(&elements);

    for (id, expected) in awkward.iter().zip(ids) {
        let selector = format!("#{}", css_escape(id));
        assert_eq!(doc.query_selector_all(&selector).unwrap(), vec![expected], "{selector}");
    }
}

#[test]
fn attribute_values_escape_quotes_and_backslashes() {
    let value = "say \"hi\" \\o/";
    let (doc, ids) = page_with(&[("button", &[("data-testid", value)], "")]);
    let selector = format!("[data-testid=\"{}\"]", escape_attr_value(value));

    assert_eq!(doc.query_selector_all(&selector).unwrap(), vec![ids[0]]);
}
