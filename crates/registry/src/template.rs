//! URI templates such as `greeting://{name}`.

use std::fmt;

use regex::Regex;

use crate::error::RegistryError;

/// A uri template compiled to an anchored pattern.
///
/// Literal text matches verbatim; each `{placeholder}` matches one or more
/// characters other than `/`.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    pattern: Regex,
    params: Vec<String>,
}

impl UriTemplate {
    pub fn parse(template: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut pattern = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find(['{', '}']) {
            if rest[open..].starts_with('}') {
                return Err(invalid("unmatched '}'"));
            }
            pattern.push_str(&regex::escape(&rest[..open]));

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unclosed '{'"))?;
            let name = &after[..close];
            if !is_identifier(name) {
                return Err(invalid("placeholder names must be identifiers"));
            }
            if params.iter().any(|p| p == name) {
                return Err(invalid("placeholder used twice"));
            }

            pattern.push_str(&format!("(?P<{name}>[^/]+)"));
            params.push(name.to_string());
            rest = &after[close + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let pattern = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            template: template.to_string(),
            pattern,
            params,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of appearance.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Bind placeholders if `uri` matches the whole template.
    pub fn matches(&self, uri: &str) -> Option<Vec<(String, String)>> {
        let captures = self.pattern.captures(uri)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|m| (name.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_single_placeholder() {
        let t = UriTemplate::parse("greeting://{name}").unwrap();
        assert_eq!(t.params(), ["name".to_string()]);
        assert_eq!(
            t.matches("greeting://hello"),
            Some(vec![("name".to_string(), "hello".to_string())])
        );
    }

    #[test]
    fn literal_prefix_must_match() {
        let t = UriTemplate::parse("greeting://{name}").unwrap();
        assert_eq!(t.matches("farewell://hello"), None);
        assert_eq!(t.matches("xgreeting://hello"), None);
    }

    #[test]
    fn placeholder_is_one_non_empty_segment() {
        let t = UriTemplate::parse("greeting://{name}").unwrap();
        assert_eq!(t.matches("greeting://"), None);
        assert_eq!(t.matches("greeting://a/b"), None);
    }

    #[test]
    fn literals_are_escaped() {
        let t = UriTemplate::parse("file://docs/{id}.txt").unwrap();
        assert!(t.matches("file://docs/readme.txt").is_some());
        assert!(t.matches("file://docs/readmeXtxt").is_none());
    }

    #[test]
    fn multiple_placeholders() {
        let t = UriTemplate::parse("users://{org}/{user}").unwrap();
        assert_eq!(
            t.matches("users://acme/ada"),
            Some(vec![
                ("org".to_string(), "acme".to_string()),
                ("user".to_string(), "ada".to_string()),
            ])
        );
    }

    #[test]
    fn malformed_templates_are_rejected() {
        for bad in ["greeting://{name", "greeting://name}", "x://{}", "x://{a}/{a}", "x://{1a}"] {
            assert!(
                matches!(UriTemplate::parse(bad), Err(RegistryError::InvalidTemplate { .. })),
                "{bad} should be rejected"
            );
        }
    }
}
