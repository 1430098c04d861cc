// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-page JS queries.
//!
//! Every locator-shaped operation is a single `evaluate` round-trip that
//! returns a JSON object; nothing in here mutates the page except
//! [`fill_field`], which focuses and fills the chosen input. Builders are
//! pure functions of their arguments.

use serde::Deserialize;

use crate::element::ElementInfo;

/// A located element: its centroid plus captured metadata.
#[derive(Clone, Debug, Deserialize)]
pub struct ProbeHit {
    pub x: f64,
    pub y: f64,
    pub element: ElementInfo,
}

/// Result of a locate query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LocateOutcome {
    /// How many candidates matched.
    #[serde(default)]
    pub count: u32,
    /// The first (or snapped) candidate.
    #[serde(default)]
    pub hit: Option<ProbeHit>,
}

/// Result of a fill query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FillOutcome {
    #[serde(default)]
    pub filled: bool,
    #[serde(default)]
    pub element: Option<ElementInfo>,
}

/// Result of a text-presence query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PresenceOutcome {
    #[serde(default)]
    pub present: bool,
}

/// Result of a visibility query.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VisibilityOutcome {
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub element: Option<ElementInfo>,
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Shared element-metadata helpers injected into every query.
const INFO_HELPERS: &str = r#"
const __clip = (s) => (s || '').replace(/\s+/g, ' ').trim().slice(0, 80) || null;
const __text = (el) => __clip(el.innerText !== undefined ? el.innerText : el.textContent);
const __labelText = (el) => {
    if (el.labels && el.labels.length) return __clip(el.labels[0].innerText);
    const id = el.getAttribute && el.getAttribute('id');
    if (id) {
        const label = document.querySelector('label[for="' + CSS.escape(id) + '"]');
        if (label) return __clip(label.innerText);
    }
    const wrapping = el.closest && el.closest('label');
    return wrapping ? __clip(wrapping.innerText) : null;
};
const __implicitRole = (el) => {
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'a' && el.hasAttribute('href')) return 'link';
    if (tag === 'textarea') return 'textbox';
    if (tag === 'select') return 'combobox';
    if (tag === 'input') {
        const type = (el.getAttribute('type') || 'text').toLowerCase();
        if (['button', 'submit', 'reset'].includes(type)) return 'button';
        if (['checkbox', 'radio'].includes(type)) return type;
        return 'textbox';
    }
    return null;
};
const __accName = (el) =>
    el.getAttribute('aria-label') || __labelText(el) || __text(el)
    || el.getAttribute('placeholder') || null;
const __visible = (el) => {
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return false;
    const style = getComputedStyle(el);
    return style.visibility !== 'hidden' && style.display !== 'none';
};
const __center = (el) => {
    const rect = el.getBoundingClientRect();
    return { x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };
};
const __info = (el) => ({
    tag: el.tagName.toLowerCase(),
    text: __text(el),
    role: el.getAttribute('role') || __implicitRole(el),
    name: __accName(el),
    id: el.getAttribute('id'),
    class: el.getAttribute('class'),
    href: el.getAttribute('href'),
    placeholder: el.getAttribute('placeholder'),
    ariaLabel: el.getAttribute('aria-label'),
    dataTestid: el.getAttribute('data-testid'),
    labelText: __labelText(el),
});
const __hit = (el) => ({ ...__center(el), element: __info(el) });
"#;

fn query(body: &str) -> String {
    format!("(() => {{\n{}\n{}\n}})()", INFO_HELPERS, body)
}

/// Magnet snap: nearest interactive element within 40 px of `(x, y)`,
/// sampled on a 6 px grid. Returns `{hit}` with the corrected centroid, or
/// `{hit: null}` when nothing interactive is in range.
pub fn magnet_snap(x: i64, y: i64) -> String {
    query(&format!(
        r#"
const cx = {x}, cy = {y};
const RADIUS = 40, STEP = 6;
const INTERACTIVE_TAGS = ['button', 'a', 'input', 'textarea', 'select', 'label'];
const interactiveAncestor = (start) => {{
    for (let el = start; el && el !== document.documentElement; el = el.parentElement) {{
        const tag = el.tagName.toLowerCase();
        if (INTERACTIVE_TAGS.includes(tag)) return el;
        if (el.getAttribute('role') === 'button') return el;
        if (el.hasAttribute('tabindex') || el.onclick) return el;
        if (getComputedStyle(el).cursor === 'pointer') return el;
    }}
    return null;
}};
let best = null, bestDist = Infinity;
for (let dx = -RADIUS; dx <= RADIUS; dx += STEP) {{
    for (let dy = -RADIUS; dy <= RADIUS; dy += STEP) {{
        if (dx * dx + dy * dy > RADIUS * RADIUS) continue;
        const el = interactiveAncestor(document.elementFromPoint(cx + dx, cy + dy));
        if (!el || !__visible(el)) continue;
        const c = __center(el);
        const dist = Math.hypot(c.x - cx, c.y - cy);
        if (dist < bestDist) {{ bestDist = dist; best = el; }}
    }}
}}
return best ? {{ hit: __hit(best) }} : {{ hit: null }};
"#
    ))
}

/// Metadata for whatever sits at `(x, y)`, without snapping.
pub fn element_at(x: i64, y: i64) -> String {
    query(&format!(
        r#"
const el = document.elementFromPoint({x}, {y});
return el ? {{ count: 1, hit: __hit(el) }} : {{ count: 0, hit: null }};
"#
    ))
}

/// Role=button locator by accessible name. `exact` compares trimmed names;
/// otherwise a case-insensitive substring match.
pub fn find_button(name: &str, exact: bool) -> String {
    query(&format!(
        r#"
const wanted = {name};
const exact = {exact};
const candidates = [...document.querySelectorAll(
    'button, [role="button"], input[type="submit"], input[type="button"]')];
const matches = candidates.filter(__visible).filter((el) => {{
    const name = (__accName(el) || '').trim();
    return exact ? name === wanted : name.toLowerCase().includes(wanted.toLowerCase());
}});
return {{ count: matches.length, hit: matches.length ? __hit(matches[0]) : null }};
"#,
        name = js_str(name),
    ))
}

/// Visible-text locator. Picks the smallest visible element whose text
/// matches, so clicks land on the label rather than a page-sized ancestor.
pub fn find_text(text: &str, exact: bool) -> String {
    query(&format!(
        r#"
const wanted = {text};
const exact = {exact};
const matchesText = (el) => {{
    const text = (el.innerText || '').trim();
    return exact ? text === wanted : text.includes(wanted);
}};
const all = [...document.querySelectorAll('*')].filter(__visible).filter(matchesText);
// Deepest matches only: drop any element with a matching descendant.
const leaves = all.filter((el) => !all.some((other) => other !== el && el.contains(other)));
return {{ count: leaves.length, hit: leaves.length ? __hit(leaves[0]) : null }};
"#,
        text = js_str(text),
    ))
}

/// Form fill: label, then placeholder, then role=textbox accessible name.
/// The first strategy with at least one match fills its first candidate.
pub fn fill_field(field: &str, value: &str, exact: bool) -> String {
    query(&format!(
        r#"
const wanted = {field};
const value = {value};
const exact = {exact};
const matchName = (name) => {{
    const trimmed = (name || '').trim();
    if (!trimmed) return false;
    return exact ? trimmed === wanted
                 : trimmed.toLowerCase().includes(wanted.toLowerCase());
}};
const inputs = [...document.querySelectorAll('input, textarea, select')].filter(__visible);
const strategies = [
    (el) => matchName(__labelText(el)),
    (el) => matchName(el.getAttribute('placeholder')),
    (el) => (__implicitRole(el) === 'textbox' || el.getAttribute('role') === 'textbox')
            && matchName(__accName(el)),
];
for (const matches of strategies) {{
    const found = inputs.filter(matches);
    if (!found.length) continue;
    const el = found[0];
    el.focus();
    if (el.tagName.toLowerCase() === 'select') {{
        el.value = value;
    }} else {{
        const proto = el.tagName.toLowerCase() === 'textarea'
            ? window.HTMLTextAreaElement.prototype
            : window.HTMLInputElement.prototype;
        const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
        setter.call(el, value);
    }}
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    return {{ filled: true, element: __info(el) }};
}}
return {{ filled: false, element: null }};
"#,
        field = js_str(field),
        value = js_str(value),
    ))
}

/// Input locator by label text, placeholder, or accessible name; used by
/// replay to re-find recorded form fields.
pub fn find_labelled_input(name: &str) -> String {
    query(&format!(
        r#"
const wanted = {name};
const matchName = (candidate) => (candidate || '').trim() === wanted;
const inputs = [...document.querySelectorAll('input, textarea, select')].filter(__visible);
const found = inputs.filter((el) =>
    matchName(__labelText(el)) || matchName(el.getAttribute('placeholder'))
    || matchName(__accName(el)));
return {{ count: found.length, hit: found.length ? __hit(found[0]) : null }};
"#,
        name = js_str(name),
    ))
}

/// CSS-selector locator, used by replay to re-find recorded elements.
pub fn find_selector(selector: &str) -> String {
    query(&format!(
        r#"
let el = null;
try {{ el = document.querySelector({selector}); }} catch (e) {{ el = null; }}
if (!el || !__visible(el)) return {{ count: 0, hit: null }};
return {{ count: 1, hit: __hit(el) }};
"#,
        selector = js_str(selector),
    ))
}

/// Substring presence over the rendered page text.
pub fn text_present(text: &str) -> String {
    query(&format!(
        r#"
const wanted = {text};
const body = document.body;
return {{ present: !!body && (body.innerText || '').includes(wanted) }};
"#,
        text = js_str(text),
    ))
}

/// Visibility of whatever sits at `(x, y)`.
pub fn visible_at(x: i64, y: i64) -> String {
    query(&format!(
        r#"
const el = document.elementFromPoint({x}, {y});
if (!el) return {{ visible: false, element: null }};
return {{ visible: __visible(el), element: __info(el) }};
"#
    ))
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
