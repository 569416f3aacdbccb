use std::collections::HashSet;

use selector_helper::locator::{
    candidate::{CandidateKind, CandidateSet},
    css_path::build_css_path,
    generator::{CandidateGenerator, GeneratorConfig, looks_generated},
};

use crate::common::fixtures::{login_page, node, page_with};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn values(set: &CandidateSet) -> Vec<&str> {
    set.values()
}

fn labelled<'a>(set: &'a CandidateSet, label: &str) -> Option<&'a str> {
    set.iter().find(|c| c.label == label).map(|c| c.value.as_str())
}

// =========================================================================
// Own-element strategies
// =========================================================================

#[test]
fn test_attribute_beats_generated_id() {
    let doc = login_page();
    let input = node(&doc, "[data-testid=\"email\"]");
    let set = CandidateGenerator::new(&doc).generate(input);

    let best = set.best().unwrap();
    assert_eq!(best.value, "[data-testid=\"email\"]");
    assert_eq!(best.label, "data-testid (own element)");
    assert_eq!(best.priority, 10);
    assert_eq!(best.kind, CandidateKind::AttributeCss);

    assert!(!values(&set).iter().any(|v| v.contains("12345678901")));
    assert_eq!(labelled(&set, "name (own element)"), Some("[name=\"email\"]"));
    assert_eq!(labelled(&set, "placeholder"), Some("you@example.com"));
}

#[test]
fn stable_id_is_used_when_unique() {
    let (doc, ids) = page_with(&[("input", &[("id", "search"), ("name", "q")], "")]);
    let set = CandidateGenerator::new(&doc).generate(ids[0]);

    assert_eq!(values(&set), vec!["#search", "[name=\"q\"]"]);
    assert_eq!(set.best().unwrap().priority, 9);
}

#[test]
fn duplicated_name_is_skipped() {
    let (doc, ids) = page_with(&[
        ("input", &[("name", "qty"), ("type", "radio")], ""),
        ("input", &[("name", "qty"), ("type", "radio")], ""),
    ]);
    let set = CandidateGenerator::new(&doc).generate(ids[1]);

    assert!(!values(&set).contains(&"[name=\"qty\"]"));
    assert_eq!(set.best().unwrap().kind, CandidateKind::CssPath);
}

#[test]
fn every_test_attribute_is_collected() {
    let (doc, ids) = page_with(&[(
        "button",
        &[("data-cy", "save"), ("data-qa", "save-btn"), ("data-test-id", "save-3")],
        "",
    )]);
    let set = CandidateGenerator::new(&doc).generate(ids[0]);

    assert_eq!(
        values(&set),
        vec!["[data-cy=\"save\"]", "[data-qa=\"save-btn\"]", "[data-test-id=\"save-3\"]"]
    );
}

// =========================================================================
// Labels
// =========================================================================

#[test]
fn label_points_at_its_control_id() {
    let doc = login_page();
    let label = node(&doc, "label[for=\"password\"]");
    let set = CandidateGenerator::new(&doc).generate(label);

    let best = set.best().unwrap();
    assert_eq!(best.value, "#password");
    assert_eq!(best.label, "label -> input id");
    assert_eq!(best.element, node(&doc, "#password"));

    // The raw label-for selector duplicates the control id and is dropped
    assert_eq!(labelled(&set, "label-for"), None);
    assert_eq!(labelled(&set, "data-testid (ancestor)"), Some("[data-testid=\"login-form\"]"));
    assert_eq!(labelled(&set, "text"), Some("Password"));
}

#[test]
fn label_prefers_control_test_attribute() {
    let mut doc = selector_helper::dom::dom_model::Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let label = doc.append_element(body, "label", &[("for", "user")]);
    let hint = doc.append_element(label, "small", &[]);
    doc.append_text(hint, "Username");
    doc.append_element(body, "input", &[("id", "user"), ("data-testid", "user-input")]);

    let set = CandidateGenerator::new(&doc).generate(hint);

    assert_eq!(set.best().unwrap().value, "[data-testid=\"user-input\"]");
    assert_eq!(set.best().unwrap().label, "label -> input data-testid");
    assert_eq!(labelled(&set, "label -> input id"), Some("#user"));
}

#[test]
fn label_for_without_control_still_yields_fallback() {
    let doc = login_page();
    let label = node(&doc, "label[for=\"email\"]");
    let set = CandidateGenerator::new(&doc).generate(label);

    let fallback = set.iter().find(|c| c.label == "label-for").unwrap();
    assert_eq!(fallback.value, "#email");
    assert_eq!(fallback.priority, 6);
    assert_eq!(set.best().unwrap().value, "#email");
}

#[test]
fn interactive_element_inside_label_is_not_redirected() {
    let mut doc = selector_helper::dom::dom_model::Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let label = doc.append_element(body, "label", &[("for", "terms")]);
    let link = doc.append_element(label, "a", &[("href", "/terms")]);
    doc.append_text(link, "terms");
    let inner = doc.append_element(link, "b", &[]);
    doc.append_text(inner, "!");
    doc.append_element(body, "input", &[("id", "terms"), ("type", "checkbox")]);

    let set = CandidateGenerator::new(&doc).generate(inner);

    assert_eq!(labelled(&set, "label -> input id"), None);
    assert_eq!(labelled(&set, "text"), Some("terms!"));
}

// =========================================================================
// Ancestors and descendants
// =========================================================================

#[test]
fn only_nearest_ancestor_hooks_are_used() {
    let mut doc = selector_helper::dom::dom_model::Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let outer = doc.append_element(body, "section", &[("data-testid", "outer")]);
    let inner = doc.append_element(outer, "div", &[("data-qa", "inner")]);
    let target = doc.append_element(inner, "em", &[]);

    let set = CandidateGenerator::new(&doc).generate(target);

    assert_eq!(labelled(&set, "data-qa (ancestor)"), Some("[data-qa=\"inner\"]"));
    assert!(!values(&set).contains(&"[data-testid=\"outer\"]"));
}

#[test]
fn ancestor_hooks_skipped_when_target_has_its_own() {
    let doc = login_page();
    let input = node(&doc, "[data-testid=\"email\"]");
    let set = CandidateGenerator::new(&doc).generate(input);

    assert!(!values(&set).contains(&"[data-testid=\"login-form\"]"));
}

#[test]
fn descendant_scan_is_capped() {
    let mut doc = selector_helper::dom::dom_model::Document::new();
    let body = doc.append_element(doc.root(), "body", &[]);
    let list = doc.append_element(body, "ul", &[]);
    for i in 0..12 {
        let value = format!("row-{}", i);
        doc.append_element(list, "li", &[("data-testid", value.as_str())]);
    }

    let set = CandidateGenerator::new(&doc).generate(list);
    let found: Vec<_> = set.iter().filter(|c| c.priority == 4).collect();
    assert_eq!(found.len(), 10);
    assert_eq!(found[0].value, "[data-testid=\"row-0\"]");
    assert_eq!(found[0].label, "data-testid (descendant/li)");

    let narrow = CandidateGenerator::with_config(&doc, GeneratorConfig { descendant_limit: 3 });
    assert_eq!(narrow.generate(list).iter().filter(|c| c.priority == 4).count(), 3);
}

// =========================================================================
// Text, alt, class, structural path
// =========================================================================

#[test]
fn click_inside_button_uses_button_text() {
    let doc = login_page();
    let icon = node(&doc, "span.icon");
    let set = CandidateGenerator::new(&doc).generate(icon);

    let text = set.iter().find(|c| c.kind == CandidateKind::TextContent).unwrap();
    assert_eq!(text.value, "Sign in");
    assert_eq!(text.element, node(&doc, "button"));
    assert_eq!(labelled(&set, "class"), Some(".icon"));
    assert_eq!(set.best().unwrap().value, "[data-testid=\"login-form\"]");
}

#[test]
fn image_alt_text_is_offered() {
    let doc = login_page();
    let img = node(&doc, "img");
    let set = CandidateGenerator::new(&doc).generate(img);

    let best = set.best().unwrap();
    assert_eq!(best.kind, CandidateKind::AltText);
    assert_eq!(best.value, "Company logo");
}

#[test]
fn long_text_is_not_a_locator() {
    let long = "This paragraph is far too long to be a useful text locator";
    let (doc, ids) = page_with(&[("button", &[], long), ("button", &[], "OK")]);

    let set = CandidateGenerator::new(&doc).generate(ids[0]);
    assert!(set.iter().all(|c| c.kind != CandidateKind::TextContent));

    let set = CandidateGenerator::new(&doc).generate(ids[1]);
    assert_eq!(labelled(&set, "text"), Some("OK"));
}

#[test]
fn noisy_and_short_classes_are_ignored() {
    let (doc, ids) = page_with(&[
        ("div", &[("class", "ng-star-inserted css-1q2w3e btn 2col panel-main")], ""),
        ("div", &[("class", "panel")], ""),
    ]);
    let set = CandidateGenerator::new(&doc).generate(ids[0]);

    assert_eq!(values(&set), vec![".panel-main"]);
}

#[test]
fn structural_path_only_when_nothing_else() {
    let doc = login_page();
    let span = node(&doc, "div.card > span");
    let set = CandidateGenerator::new(&doc).generate(span);

    assert_eq!(set.len(), 1);
    let only = set.best().unwrap();
    assert_eq!(only.kind, CandidateKind::CssPath);
    assert_eq!(only.value, "html > body > div > span");
    assert_eq!(only.priority, 0);
}

#[test]
fn css_path_stops_at_nearest_id() {
    let doc = login_page();
    let input = node(&doc, "#password");

    assert_eq!(build_css_path(&doc, input), "input#password");
    assert_eq!(
        build_css_path(&doc, node(&doc, "label[for=\"password\"]")),
        "html > body > form > label:nth-of-type(2)"
    );
}

#[test]
fn text_node_target_uses_its_element() {
    let doc = login_page();
    let link = node(&doc, "a");
    let text_node = doc.children(link)[0];

    let from_text = CandidateGenerator::new(&doc).generate(text_node);
    let from_element = CandidateGenerator::new(&doc).generate(link);
    assert_eq!(from_text, from_element);
}

// =========================================================================
// Whole-page properties
// =========================================================================

#[test]
fn no_two_candidates_share_a_value() {
    let doc = login_page();
    let generator = CandidateGenerator::new(&doc);

    for element in doc.all_elements() {
        let set = generator.generate(element);
        let unique: HashSet<&str> = set.values().into_iter().collect();
        assert_eq!(unique.len(), set.len(), "duplicates for {:?}", doc.tag(element));
    }
}

#[test]
fn candidates_are_sorted_by_priority() {
    let doc = login_page();
    let generator = CandidateGenerator::new(&doc);

    for element in doc.all_elements() {
        let set = generator.generate(element);
        assert!(!set.is_empty());
        let priorities: Vec<i32> = set.iter().map(|c| c.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] >= w[1]), "{priorities:?}");
    }
}

#[test]
fn element_paths_resolve_to_their_source() {
    let doc = login_page();
    let generator = CandidateGenerator::new(&doc);

    for element in doc.all_elements() {
        let path = build_css_path(&doc, element);
        assert_eq!(doc.query_selector_all(&path).unwrap(), vec![element], "{path}");

        for candidate in &generator.generate(element) {
            let found = doc.query_selector_all(&candidate.unique_element_path).unwrap();
            assert_eq!(found, vec![candidate.element]);
        }
    }
}

// =========================================================================
// Generated id heuristic
// =========================================================================

#[test]
fn generated_ids_are_recognised() {
    assert!(looks_generated("12345678901"));
    assert!(looks_generated("42"));
    assert!(looks_generated(":r1:"));
    assert!(looks_generated("ember:1"));
    assert!(looks_generated("row-1234567890"));

    assert!(!looks_generated("main"));
    assert!(!looks_generated("step-2"));
    assert!(!looks_generated("order-123456789"));
}
