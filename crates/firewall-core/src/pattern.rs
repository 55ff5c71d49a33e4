//! REST route templates compiled into anchored matchers
//!
//! Two placeholder forms are understood:
//! - `{name}` matches exactly one non-empty path segment
//! - `{name=*}` (or `{name=**}`) matches any remaining suffix, slashes included
//!
//! Compiled patterns always match the full path and tolerate a trailing
//! query string, so `/blocks/{height}` accepts `/blocks/12?encoding=json`
//! but never `/blocks/12/extra`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[A-Za-z0-9_.]+(=\*{1,2})?\}").expect("placeholder pattern must be valid")
});

/// A compiled route template
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    templated: bool,
}

impl PathPattern {
    /// Compile a template
    ///
    /// Literal text between placeholders is escaped, so dots or other regex
    /// metacharacters in a template only ever match themselves.
    pub fn new(template: &str) -> Result<Self> {
        let mut pattern = String::with_capacity(template.len() + 16);
        pattern.push_str("(?i)^");

        let mut last = 0;
        let mut templated = false;
        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            pattern.push_str(&regex::escape(&template[last..whole.start()]));
            if caps.get(1).is_some() {
                pattern.push_str("(.*)");
            } else {
                pattern.push_str("([^/]+)");
            }
            last = whole.end();
            templated = true;
        }
        pattern.push_str(&regex::escape(&template[last..]));
        pattern.push_str(r"(\?.*)?$");

        let regex = Regex::new(&pattern).map_err(|e| Error::InvalidTemplate {
            template: template.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            templated,
        })
    }

    /// True if `path` (optionally with a query string) fully matches the template
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// True if the template contains at least one placeholder
    pub fn is_templated(&self) -> bool {
        self.templated
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

/// True if the route contains a `{...}` placeholder
pub(crate) fn is_template(route: &str) -> bool {
    PLACEHOLDER.is_match(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(template: &str) -> PathPattern {
        PathPattern::new(template).unwrap()
    }

    #[test]
    fn test_single_segment_placeholder() {
        let p = compile("/cosmos/bank/v1beta1/balances/{address}");
        assert!(p.is_templated());
        assert!(p.matches("/cosmos/bank/v1beta1/balances/cosmos1abc"));
        assert!(p.matches("/cosmos/bank/v1beta1/balances/cosmos1abc?pagination.limit=10"));
        assert!(!p.matches("/cosmos/bank/v1beta1/balances/"));
        assert!(!p.matches("/cosmos/bank/v1beta1/balances/cosmos1abc/extra"));
    }

    #[test]
    fn test_placeholder_in_the_middle() {
        let p = compile("/cosmos/bank/v1beta1/balances/{address}/by_denom");
        assert!(p.matches("/cosmos/bank/v1beta1/balances/fx1xyz/by_denom?denom=FX"));
        assert!(!p.matches("/cosmos/bank/v1beta1/balances/fx1xyz"));
        assert!(!p.matches("/cosmos/bank/v1beta1/balances/fx1xyz/by_denom/more"));
    }

    #[test]
    fn test_multiple_placeholders() {
        let p = compile(
            "/cosmos/staking/v1beta1/validators/{validator_addr}/delegations/{delegator_addr}",
        );
        assert!(p.matches("/cosmos/staking/v1beta1/validators/val1/delegations/del1"));
        assert!(!p.matches("/cosmos/staking/v1beta1/validators/val1/delegations"));
        assert!(!p.matches("/cosmos/staking/v1beta1/validators/val1/delegations/del1/x"));
    }

    #[test]
    fn test_wildcard_suffix() {
        let p = compile("/ibc/apps/transfer/v1/denom_traces/{hash=**}");
        assert!(p.matches("/ibc/apps/transfer/v1/denom_traces/ABCD"));
        assert!(p.matches("/ibc/apps/transfer/v1/denom_traces/transfer/channel-0/uatom"));

        let p = compile("/cosmos/bank/v1beta1/denoms_metadata/{denom=*}");
        assert!(p.matches("/cosmos/bank/v1beta1/denoms_metadata/ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2"));
    }

    #[test]
    fn test_exact_template() {
        let p = compile("/cosmos/tx/v1beta1/simulate");
        assert!(!p.is_templated());
        assert!(p.matches("/cosmos/tx/v1beta1/simulate"));
        assert!(p.matches("/COSMOS/tx/v1beta1/Simulate"));
        assert!(!p.matches("/cosmos/tx/v1beta1/simulate/x"));
        assert!(!p.matches("/prefix/cosmos/tx/v1beta1/simulate"));
    }

    #[test]
    fn test_literal_dots_are_escaped() {
        let p = compile("/node.info/{id}");
        assert!(p.matches("/node.info/7"));
        assert!(!p.matches("/nodeXinfo/7"));
    }

    #[test]
    fn test_is_template() {
        assert!(is_template("/blocks/{height}"));
        assert!(is_template("/x/{path=*}"));
        assert!(!is_template("/blocks/latest"));
    }
}
