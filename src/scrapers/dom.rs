//! Generic view of interactive page elements.
//!
//! The live DOM is an external, shape-shifting document: nothing here
//! assumes a fixed schema. Each element is snapshotted into a plain
//! [`RawElement`] record by a single page-side script, and all downstream
//! code queries it through the [`QueryableElement`] capability, with no
//! dependency on the automation library.

use std::collections::HashMap;

use serde::Deserialize;

/// Page-side script producing one record per `input`/`select`/`textarea`.
///
/// Elements that throw while being read yield `null` so one bad element
/// never poisons the harvest; label context is resolved in-page where the
/// DOM relationships are still available.
pub const HARVEST_SCRIPT: &str = r#"
(() => {
    const clean = (t) => (t || '').replace(/\s+/g, ' ').trim();
    const firstLine = (t) => {
        for (const line of (t || '').split('\n')) {
            const s = clean(line);
            if (s) return s;
        }
        return '';
    };
    const out = [];
    for (const el of document.querySelectorAll('input, select, textarea')) {
        try {
            const rec = {
                tag: el.tagName.toLowerCase(),
                attrs: {},
                options: [],
                labels: { explicit: '', ancestor: '', preceding: '', container: '' },
            };
            for (const attr of el.attributes) {
                rec.attrs[attr.name] = attr.value;
            }
            if (rec.tag === 'select') {
                for (const opt of el.querySelectorAll('option')) {
                    rec.options.push({ value: opt.value || '', text: clean(opt.textContent) });
                }
            }
            if (el.id) {
                const lab = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
                if (lab) rec.labels.explicit = clean(lab.textContent);
            }
            const ancestor = el.closest('label');
            if (ancestor) rec.labels.ancestor = clean(ancestor.textContent);
            let sib = el.previousElementSibling;
            while (sib) {
                if (sib.tagName === 'LABEL') {
                    rec.labels.preceding = clean(sib.textContent);
                    break;
                }
                sib = sib.previousElementSibling;
            }
            if (el.parentElement) {
                rec.labels.container = firstLine(el.parentElement.textContent);
            }
            out.push(rec);
        } catch (e) {
            out.push(null);
        }
    }
    return out;
})()
"#;

/// One `<option>` child of a select, in document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawOption {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub text: String,
}

/// Label text found near an element, one slot per lookup strategy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LabelContext {
    /// `label[for]` association via the element's id.
    #[serde(default)]
    pub explicit: String,
    /// Ancestor label enclosing the element.
    #[serde(default)]
    pub ancestor: String,
    /// Nearest preceding-sibling label.
    #[serde(default)]
    pub preceding: String,
    /// First non-blank line of the enclosing container's text.
    #[serde(default)]
    pub container: String,
}

/// Snapshot of one interactive element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawElement {
    pub tag: String,
    #[serde(default)]
    pub attrs: HashMap<String, String>,
    #[serde(default)]
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub labels: LabelContext,
}

/// Capability query over a form element: "does this handle expose X?".
///
/// The extractor only sees this trait, so it can be exercised against
/// hand-built snapshots without a browser.
pub trait QueryableElement {
    fn tag(&self) -> &str;
    fn attr(&self, name: &str) -> Option<&str>;
    fn has_attr(&self, name: &str) -> bool;
    fn options(&self) -> &[RawOption];
    fn labels(&self) -> &LabelContext;
}

impl QueryableElement for RawElement {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    fn options(&self) -> &[RawOption] {
        &self.options
    }

    fn labels(&self) -> &LabelContext {
        &self.labels
    }
}
