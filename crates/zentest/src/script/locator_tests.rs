// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn info(tag: &str) -> ElementInfo {
    ElementInfo {
        tag: tag.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_testid_first() {
    let el = ElementInfo {
        data_testid: Some("login-btn".to_string()),
        role: Some("button".to_string()),
        aria_label: Some("Log in".to_string()),
        ..info("button")
    };
    assert_eq!(
        build_locator(&el),
        Some(Locator::TestId("login-btn".to_string()))
    );
}

#[test]
fn test_button_role_with_text_name() {
    // the probe folds visible text into the computed accessible name
    let el = ElementInfo {
        text: Some("Sign In".to_string()),
        name: Some("Sign In".to_string()),
        ..info("button")
    };
    assert_eq!(
        build_locator(&el),
        Some(Locator::Role {
            role: "button".to_string(),
            name: "Sign In".to_string(),
        })
    );
}

#[test]
fn test_input_defaults_to_textbox_role() {
    let el = ElementInfo {
        aria_label: Some("Email".to_string()),
        ..info("input")
    };
    assert_eq!(
        build_locator(&el),
        Some(Locator::Role {
            role: "textbox".to_string(),
            name: "Email".to_string(),
        })
    );
}

#[test]
fn test_accessible_name_prefers_aria_label_then_label() {
    let el = ElementInfo {
        aria_label: Some("Search".to_string()),
        label_text: Some("Find".to_string()),
        ..info("input")
    };
    assert!(matches!(
        build_locator(&el),
        Some(Locator::Role { name, .. }) if name == "Search"
    ));

    let el = ElementInfo {
        label_text: Some("Find".to_string()),
        ..info("input")
    };
    assert!(matches!(
        build_locator(&el),
        Some(Locator::Role { name, .. }) if name == "Find"
    ));
}

#[test]
fn test_placeholder_feeds_accessible_name_for_inputs() {
    let el = ElementInfo {
        placeholder: Some("you@example.com".to_string()),
        ..info("input")
    };
    // placeholder is the accessible name of last resort, so the role locator
    // still wins over the bare placeholder locator
    assert_eq!(
        build_locator(&el),
        Some(Locator::Role {
            role: "textbox".to_string(),
            name: "you@example.com".to_string(),
        })
    );
}

#[test]
fn test_plain_div_text_locator() {
    let el = ElementInfo {
        text: Some("Dashboard".to_string()),
        ..info("div")
    };
    assert_eq!(
        build_locator(&el),
        Some(Locator::Text {
            text: "Dashboard".to_string(),
            exact: true,
        })
    );
}

#[test]
fn test_id_locator() {
    let el = ElementInfo {
        id: Some("sidebar".to_string()),
        ..info("div")
    };
    assert_eq!(build_locator(&el), Some(Locator::Id("sidebar".to_string())));
}

#[test]
fn test_raw_selector_for_specific_non_generic() {
    let el = ElementInfo {
        selector: Some("div.card.primary".to_string()),
        ..info("div")
    };
    assert_eq!(
        build_locator(&el),
        Some(Locator::Css("div.card.primary".to_string()))
    );
}

#[test]
fn test_generic_selector_rejected() {
    let el = ElementInfo {
        selector: Some("div".to_string()),
        ..info("div")
    };
    assert_eq!(build_locator(&el), None);
}

#[test]
fn test_button_never_falls_back_to_css() {
    let el = ElementInfo {
        selector: Some("button.fancy.wide".to_string()),
        ..info("button")
    };
    // no name, no label, no text: coordinate fallback instead of brittle CSS
    assert_eq!(build_locator(&el), None);
}

#[test]
fn test_input_never_falls_back_to_css() {
    let el = ElementInfo {
        selector: Some("input.form-control".to_string()),
        ..info("input")
    };
    assert_eq!(build_locator(&el), None);
}

mod rendering {
    use super::*;

    #[test]
    fn test_role_code() {
        let loc = Locator::Role {
            role: "button".to_string(),
            name: "Sign In".to_string(),
        };
        assert_eq!(
            loc.to_code(),
            "page.getByRole('button', { name: 'Sign In', exact: true })"
        );
    }

    #[test]
    fn test_text_code_exact() {
        let loc = Locator::Text {
            text: "Welcome".to_string(),
            exact: true,
        };
        assert_eq!(loc.to_code(), "page.getByText('Welcome', { exact: true })");
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape("it's"), "it\\'s");
        assert_eq!(escape("a\\b"), "a\\\\b");
        assert_eq!(escape("line\nbreak\ttab\r"), "line\\nbreak\\ttab\\r");
    }

    #[test]
    fn test_escaped_quote_in_code() {
        let loc = Locator::Label("User's email".to_string());
        assert_eq!(loc.to_code(), "page.getByLabel('User\\'s email')");
    }
}
