//! Directive parser.
//!
//! Scans annotation text (typically an image's alt-text) for directives such
//! as `@transparent(threshold=20, remove="below") @boost-lightness` and turns
//! them into an ordered list of [`FilterSpec`]s. Parsing never fails as a
//! whole: a malformed directive is skipped and recorded as a diagnostic, and
//! scanning continues right after its name.

mod arguments;

use crate::core::error::DirectiveError;
use crate::core::types::Parameters;
use crate::execution::pipeline::FilterChain;
use crate::filters::registry::FilterRegistry;
use serde::{Deserialize, Serialize};

use arguments::{is_name_byte, parse_arguments};

/// One parsed directive: a filter name and its typed arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub name: String,
    #[serde(default)]
    pub parameters: Parameters,
}

impl FilterSpec {
    /// Create a spec without arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Parameters::new(),
        }
    }

    /// Create a spec with arguments.
    pub fn with_parameters(name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Result of scanning one annotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    /// Directives that parsed, in text order.
    pub specs: Vec<FilterSpec>,
    /// Directives that were skipped.
    pub diagnostics: Vec<DirectiveError>,
}

/// Stateless scanner for the directive language.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveParser;

impl DirectiveParser {
    /// Create a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse `text`, dropping malformed directives.
    pub fn parse(&self, text: &str) -> Vec<FilterSpec> {
        let output = self.parse_with_diagnostics(text);
        for diagnostic in &output.diagnostics {
            log::debug!("[parser] skipped: {}", diagnostic);
        }
        output.specs
    }

    /// Parse `text`, returning the skipped directives alongside the specs.
    pub fn parse_with_diagnostics(&self, text: &str) -> ParseOutput {
        let bytes = text.as_bytes();
        let mut output = ParseOutput::default();
        let mut i = 0;
        // End of the last directive name; a directive may follow it directly.
        let mut name_boundary = 0;

        while i < bytes.len() {
            if bytes[i] != b'@' {
                i += 1;
                continue;
            }

            // Mid-word `@` (`me@invert.io`) is not a directive.
            if i > 0 && i != name_boundary && is_name_byte(bytes[i - 1]) {
                i += 1;
                continue;
            }

            let name_start = i + 1;
            let mut name_end = name_start;
            while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                name_end += 1;
            }
            if name_end == name_start {
                i += 1;
                continue;
            }
            let name = &text[name_start..name_end];
            name_boundary = name_end;

            // Arguments must follow the name directly.
            if bytes.get(name_end) != Some(&b'(') {
                output.specs.push(FilterSpec::new(name));
                i = name_end;
                continue;
            }

            let args_start = name_end + 1;
            let parsed = find_closing_paren(name, bytes, args_start).and_then(|close| {
                parse_arguments(name, &text[args_start..close]).map(|params| (params, close))
            });

            match parsed {
                Ok((parameters, close)) => {
                    output
                        .specs
                        .push(FilterSpec::with_parameters(name, parameters));
                    i = close + 1;
                }
                Err(e) => {
                    output.diagnostics.push(e);
                    i = name_end;
                }
            }
        }

        output
    }

    /// Resolve specs against a registry. Unknown names are dropped.
    pub fn resolve(&self, specs: &[FilterSpec], registry: &FilterRegistry) -> FilterChain {
        let mut chain = FilterChain::new();
        for spec in specs {
            match registry.create(&spec.name, &spec.parameters) {
                Some(filter) => chain.push(filter),
                None => log::debug!(
                    "[parser] dropped: {}",
                    DirectiveError::UnknownFilter {
                        name: spec.name.clone()
                    }
                ),
            }
        }
        chain
    }
}

/// Parse `text` and build the filter chain it requests.
///
/// An empty chain means no filters were requested.
pub fn parse_filters(text: &str, registry: &FilterRegistry) -> FilterChain {
    let parser = DirectiveParser::new();
    parser.resolve(&parser.parse(text), registry)
}

/// Find the `)` closing an argument list that starts at `start`.
///
/// Parentheses inside quotes do not count. An unquoted `(` is rejected since
/// argument lists do not nest.
fn find_closing_paren(name: &str, bytes: &[u8], start: usize) -> Result<usize, DirectiveError> {
    let mut in_quote = false;
    let mut quote_start = start;
    let mut i = start;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'"' => {
                in_quote = !in_quote;
                quote_start = i;
            }
            b')' if !in_quote => return Ok(i),
            b'(' if !in_quote => {
                return Err(DirectiveError::UnbalancedParentheses {
                    name: name.to_string(),
                    offset: i,
                })
            }
            _ => {}
        }
        i += 1;
    }

    if in_quote {
        Err(DirectiveError::UnterminatedQuote {
            name: name.to_string(),
            offset: quote_start,
        })
    } else {
        Err(DirectiveError::UnbalancedParentheses {
            name: name.to_string(),
            offset: start - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ParamValue;
    use proptest::prelude::*;

    fn names(specs: &[FilterSpec]) -> Vec<&str> {
        specs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_plain_directives() {
        let specs = DirectiveParser::new().parse("A chart @invert and @darkmode.");
        assert_eq!(names(&specs), vec!["invert", "darkmode"]);
        assert!(specs.iter().all(|s| s.parameters.is_empty()));
    }

    #[test]
    fn test_directive_with_arguments() {
        let specs = DirectiveParser::new()
            .parse(r#"@transparent( threshold = 20 , remove = "below" ) @boost-lightness(amount=1.1)"#);
        assert_eq!(names(&specs), vec!["transparent", "boost-lightness"]);
        assert_eq!(specs[0].parameters["threshold"], ParamValue::Number(20.0));
        assert_eq!(specs[0].parameters["remove"], ParamValue::Text("below".into()));
        assert_eq!(specs[1].parameters["amount"], ParamValue::Number(1.1));
    }

    #[test]
    fn test_paren_must_follow_name() {
        let specs = DirectiveParser::new().parse("@contrast (amount=3)");
        assert_eq!(names(&specs), vec!["contrast"]);
        assert!(specs[0].parameters.is_empty());
    }

    #[test]
    fn test_quoted_parenthesis_does_not_close() {
        let specs = DirectiveParser::new().parse(r#"@x(label="a ) b", n=2) @invert"#);
        assert_eq!(names(&specs), vec!["x", "invert"]);
        assert_eq!(specs[0].parameters["label"], ParamValue::Text("a ) b".into()));
        assert_eq!(specs[0].parameters["n"], ParamValue::Number(2.0));
    }

    #[test]
    fn test_escaped_characters() {
        let specs = DirectiveParser::new().parse(r#"@x(label="\"\(\)\\")"#);
        assert_eq!(specs[0].parameters["label"], ParamValue::Text(r#""()\"#.into()));
    }

    #[test]
    fn test_malformed_directive_does_not_block_siblings() {
        let output = DirectiveParser::new()
            .parse_with_diagnostics("@invert(amount=1 @contrast(amount=2) @sharpness");
        assert_eq!(names(&output.specs), vec!["contrast", "sharpness"]);
        assert_eq!(
            output.diagnostics,
            vec![DirectiveError::UnbalancedParentheses {
                name: "invert".into(),
                offset: 26,
            }]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let output = DirectiveParser::new().parse_with_diagnostics(r#"@x(a="oops) @invert"#);
        // Scanning resumes after the name, so the sibling is still found.
        assert_eq!(names(&output.specs), vec!["invert"]);
        assert!(matches!(
            output.diagnostics.as_slice(),
            [DirectiveError::UnterminatedQuote { offset: 5, .. }]
        ));
    }

    #[test]
    fn test_missing_close_paren_at_end() {
        let output = DirectiveParser::new().parse_with_diagnostics("@invert @contrast(amount=2");
        assert_eq!(names(&output.specs), vec!["invert"]);
        assert_eq!(
            output.diagnostics,
            vec![DirectiveError::UnbalancedParentheses {
                name: "contrast".into(),
                offset: 17,
            }]
        );
    }

    #[test]
    fn test_invalid_argument_skips_directive() {
        let output = DirectiveParser::new().parse_with_diagnostics("@contrast(amount=a b) @invert");
        assert_eq!(names(&output.specs), vec!["invert"]);
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn test_lone_at_sign_and_email() {
        let specs = DirectiveParser::new().parse("mail me @ home, a@b.c @");
        assert!(specs.is_empty());
    }

    #[test]
    fn test_directive_needs_word_boundary() {
        let parser = DirectiveParser::new();
        assert!(parser.parse("write to me@invert.io").is_empty());
        assert!(parser.parse("x_@invert 9@contrast(amount=2)").is_empty());

        assert_eq!(names(&parser.parse("@invert")), vec!["invert"]);
        assert_eq!(names(&parser.parse("chart (@invert).")), vec!["invert"]);
        assert_eq!(names(&parser.parse("a.@invert,@darkmode")), vec!["invert", "darkmode"]);
    }

    #[test]
    fn test_adjacent_directives() {
        let specs = DirectiveParser::new().parse("@invert@contrast(amount=2)@darkmode");
        assert_eq!(names(&specs), vec!["invert", "contrast", "darkmode"]);
    }

    #[test]
    fn test_resolution_drops_unknown_names() {
        let registry = FilterRegistry::with_builtins();
        let chain = parse_filters("@sepia @invert @contrast(amount=2) @dark", &registry);
        assert_eq!(
            chain.signatures(),
            vec!["invert", "contrast(amount=2)", "darkmode"]
        );
    }

    #[test]
    fn test_no_directives_means_empty_chain() {
        let registry = FilterRegistry::with_builtins();
        assert!(parse_filters("just a caption", &registry).is_empty());
        assert!(parse_filters("", &registry).is_empty());
    }

    #[test]
    fn test_spec_serializes_to_json() {
        let specs = DirectiveParser::new().parse("@contrast(amount=2, fast)");
        let json = serde_json::to_string(&specs).unwrap();
        assert_eq!(
            json,
            r#"[{"name":"contrast","parameters":{"amount":{"type":"number","value":2.0},"fast":{"type":"boolean","value":true}}}]"#
        );
    }

    proptest! {
        #[test]
        fn prop_parsing_is_deterministic(text in "[ -~]{0,64}") {
            let registry = FilterRegistry::with_builtins();
            let first = parse_filters(&text, &registry).signatures();
            let second = parse_filters(&text, &registry).signatures();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_parser_never_panics(text in "\\PC{0,64}") {
            let output = DirectiveParser::new().parse_with_diagnostics(&text);
            prop_assert!(output.specs.iter().all(|s| !s.name.is_empty()));
        }
    }
}
