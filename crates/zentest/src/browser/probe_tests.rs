// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn test_strings_are_quoted_into_js() {
    let js = find_button("Sign \"In\"", true);
    assert!(js.contains(r#"const wanted = "Sign \"In\"";"#));
    assert!(js.contains("const exact = true;"));
}

#[test]
fn test_fill_field_embeds_both_strings() {
    let js = fill_field("Email", "foo@example.com", false);
    assert!(js.contains(r#"const wanted = "Email";"#));
    assert!(js.contains(r#"const value = "foo@example.com";"#));
    assert!(js.contains("const exact = false;"));
}

#[test]
fn test_magnet_snap_embeds_coordinates_and_radius() {
    let js = magnet_snap(400, 300);
    assert!(js.contains("const cx = 400, cy = 300;"));
    assert!(js.contains("RADIUS = 40"));
    assert!(js.contains("STEP = 6"));
}

#[test]
fn test_builders_are_deterministic() {
    assert_eq!(find_text("Welcome", false), find_text("Welcome", false));
    assert_eq!(text_present("x"), text_present("x"));
}

#[test]
fn test_locate_outcome_parses_probe_json() {
    let json = r#"{
        "count": 2,
        "hit": {
            "x": 120.5,
            "y": 44.0,
            "element": {
                "tag": "button",
                "text": "Sign In",
                "role": "button",
                "ariaLabel": null,
                "dataTestid": "login"
            }
        }
    }"#;
    let outcome: LocateOutcome = serde_json::from_str(json).unwrap();
    assert_eq!(outcome.count, 2);
    let hit = outcome.hit.unwrap();
    assert_eq!(hit.x, 120.5);
    assert_eq!(hit.element.tag, "button");
    assert_eq!(hit.element.data_testid.as_deref(), Some("login"));
}

#[test]
fn test_locate_outcome_tolerates_null_hit() {
    let outcome: LocateOutcome = serde_json::from_str(r#"{"count":0,"hit":null}"#).unwrap();
    assert_eq!(outcome.count, 0);
    assert!(outcome.hit.is_none());
}

#[test]
fn test_fill_outcome_parses() {
    let outcome: FillOutcome =
        serde_json::from_str(r#"{"filled":true,"element":{"tag":"input"}}"#).unwrap();
    assert!(outcome.filled);
    assert_eq!(outcome.element.unwrap().tag, "input");
}

#[test]
fn test_presence_outcome_defaults_false() {
    let outcome: PresenceOutcome = serde_json::from_str("{}").unwrap();
    assert!(!outcome.present);
}
