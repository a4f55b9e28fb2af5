//! The expander: one-pass placeholder substitution on a fragment body.
//!
//! Two surfaces are recognized, per the placeholder grammar:
//!
//! ```text
//! placeholder := "${" name ("_" filter | ":" filter)? "}"
//! name        := [a-z][a-z0-9_]*
//! filter      := "upper_case" | "lower_case"
//! ```
//!
//! `${name_upper_case}` parses as a plain name (underscores are name
//! characters); the binding context resolves it by falling back to the
//! filtered base value when no explicit key exists. `${name:filter}`
//! prefers an explicit `name_<filter>` key over computing the filter,
//! which keeps legacy call sites that pass both forms working.
//!
//! The expander is a pure function of (fragment text, context). It does
//! no escaping and knows nothing about the target language.

use std::collections::BTreeMap;

use crate::error::ExpandDetail;

/// Placeholder name to value mapping for one artifact.
#[derive(Debug, Clone, Default)]
pub struct BindingContext {
    values: BTreeMap<String, String>,
}

impl BindingContext {
    pub fn new() -> Self {
        BindingContext::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Exact key lookup, no derivation.
    pub fn get_raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Lookup with derived-filter fallback: `x_upper_case` resolves to the
    /// uppercased value of `x` unless an explicit key shadows it.
    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = self.get_raw(name) {
            return Some(value.to_string());
        }
        if let Some(base) = name.strip_suffix("_upper_case") {
            if let Some(value) = self.get_raw(base) {
                return Some(value.to_ascii_uppercase());
            }
        }
        if let Some(base) = name.strip_suffix("_lower_case") {
            if let Some(value) = self.get_raw(base) {
                return Some(value.to_ascii_lowercase());
            }
        }
        None
    }

    /// Later entries win over earlier ones.
    pub fn merge(&mut self, overlay: &[(String, String)]) {
        for (name, value) in overlay {
            self.values.insert(name.clone(), value.clone());
        }
    }
}

fn apply_filter(filter: &str, value: &str) -> Option<String> {
    match filter {
        "upper_case" => Some(value.to_ascii_uppercase()),
        "lower_case" => Some(value.to_ascii_lowercase()),
        _ => None,
    }
}

fn is_name_byte(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'_'
}

/// Up to 24 characters of context for a malformed-placeholder report.
fn snippet(text: &str, from: usize) -> String {
    text[from..].chars().take(24).collect()
}

/// Substitute every placeholder in `text` from `context`.
///
/// A `$` not followed by `{` is literal. Missing placeholders are errors,
/// never silently empty: the schema is supposed to be total.
pub fn expand(text: &str, context: &BindingContext) -> Result<String, ExpandDetail> {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut literal_start = 0usize;
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'$' || bytes.get(i + 1) != Some(&b'{') {
            i += 1;
            continue;
        }
        out.push_str(&text[literal_start..i]);

        let name_start = i + 2;
        let mut j = name_start;
        if j >= bytes.len() || !bytes[j].is_ascii_lowercase() {
            return Err(ExpandDetail::Malformed(snippet(text, i)));
        }
        while j < bytes.len() && is_name_byte(bytes[j]) {
            j += 1;
        }
        let name = &text[name_start..j];

        match bytes.get(j) {
            Some(b'}') => {
                let value = context
                    .get(name)
                    .ok_or_else(|| ExpandDetail::MissingPlaceholder(name.to_string()))?;
                out.push_str(&value);
                i = j + 1;
            }
            Some(b':') => {
                let filter_start = j + 1;
                let mut k = filter_start;
                while k < bytes.len() && is_name_byte(bytes[k]) {
                    k += 1;
                }
                if bytes.get(k) != Some(&b'}') {
                    return Err(ExpandDetail::Malformed(snippet(text, i)));
                }
                let filter = &text[filter_start..k];
                if !matches!(filter, "upper_case" | "lower_case") {
                    return Err(ExpandDetail::UnknownFilter(filter.to_string()));
                }
                // Explicit `name_<filter>` keys take precedence over the
                // computed transform.
                let value = match context.get_raw(&format!("{name}_{filter}")) {
                    Some(explicit) => explicit.to_string(),
                    None => {
                        let base = context
                            .get(name)
                            .ok_or_else(|| ExpandDetail::MissingPlaceholder(name.to_string()))?;
                        apply_filter(filter, &base)
                            .ok_or_else(|| ExpandDetail::UnknownFilter(filter.to_string()))?
                    }
                };
                out.push_str(&value);
                i = k + 1;
            }
            _ => return Err(ExpandDetail::Malformed(snippet(text, i))),
        }
        literal_start = i;
    }
    out.push_str(&text[literal_start..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> BindingContext {
        let mut ctx = BindingContext::new();
        ctx.set("library_name", "libsample");
        ctx.set("structure_name", "widget_header");
        ctx
    }

    #[test]
    fn plain_substitution() {
        let out = expand("struct ${library_name}_${structure_name};", &context()).expect("ok");
        assert_eq!(out, "struct libsample_widget_header;");
    }

    #[test]
    fn filter_surface_and_derived_key_surface_agree() {
        let ctx = context();
        let colon = expand("${library_name:upper_case}", &ctx).expect("ok");
        let underscore = expand("${library_name_upper_case}", &ctx).expect("ok");
        assert_eq!(colon, "LIBSAMPLE");
        assert_eq!(underscore, "LIBSAMPLE");
    }

    #[test]
    fn both_surfaces_resolve_in_one_fragment() {
        // libyal_bit_stream.h references the same name through both forms.
        let out = expand(
            "#if !defined( ${library_name:upper_case}_H )\ntypedef ${library_name}_t;\n",
            &context(),
        )
        .expect("ok");
        assert!(out.contains("LIBSAMPLE_H"));
        assert!(out.contains("libsample_t"));
    }

    #[test]
    fn explicit_key_beats_computed_filter() {
        let mut ctx = context();
        ctx.set("library_name_upper_case", "LegacySpelling");
        let out = expand("${library_name:upper_case}", &ctx).expect("ok");
        assert_eq!(out, "LegacySpelling");
    }

    #[test]
    fn lower_case_filter() {
        let mut ctx = BindingContext::new();
        ctx.set("signature", "WD");
        assert_eq!(expand("${signature:lower_case}", &ctx).expect("ok"), "wd");
    }

    #[test]
    fn dollar_without_brace_is_literal() {
        let out = expand("cost: $5 and a $ sign", &context()).expect("ok");
        assert_eq!(out, "cost: $5 and a $ sign");
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let error = expand("${no_such_name}", &context()).unwrap_err();
        assert_eq!(
            error,
            ExpandDetail::MissingPlaceholder("no_such_name".to_string())
        );
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let error = expand("${library_name:title_case}", &context()).unwrap_err();
        assert_eq!(error, ExpandDetail::UnknownFilter("title_case".to_string()));
    }

    #[test]
    fn malformed_placeholders_are_authoring_errors() {
        assert!(matches!(
            expand("${Library}", &context()),
            Err(ExpandDetail::Malformed(_))
        ));
        assert!(matches!(
            expand("${library_name", &context()),
            Err(ExpandDetail::Malformed(_))
        ));
        assert!(matches!(
            expand("${library_name!}", &context()),
            Err(ExpandDetail::Malformed(_))
        ));
    }

    #[test]
    fn substituted_text_is_verbatim() {
        let mut ctx = BindingContext::new();
        ctx.set("body", "a \"quoted\" <thing>");
        assert_eq!(
            expand("${body}", &ctx).expect("ok"),
            "a \"quoted\" <thing>"
        );
    }
}
