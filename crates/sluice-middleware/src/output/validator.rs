//! Ordered response contracts of one route.

use http::StatusCode;
use sluice_core::{CompileError, ConfigError, RouteError, SchemaService};

use super::rule::{OutputRule, ResponseContract};
use crate::context::ResponseData;

/// Message of the error raised when no rule covers the response status.
pub const UNCOVERED_STATUS: &str = "response status not covered by any declared output contract";

/// The response contracts of a route, in declaration order.
///
/// No two rules may overlap, so at most one rule matches any status.
#[derive(Debug, Clone)]
pub struct OutputValidator {
    rules: Vec<OutputRule>,
}

impl OutputValidator {
    /// Creates a validator, rejecting overlapping rules.
    pub fn new(rules: Vec<OutputRule>) -> Result<Self, ConfigError> {
        for (i, first) in rules.iter().enumerate() {
            if let Some(second) = rules[i + 1..].iter().find(|other| first.overlaps(other)) {
                return Err(ConfigError::OverlappingOutputRules {
                    first: first.status().to_string(),
                    second: second.status().to_string(),
                });
            }
        }
        Ok(Self { rules })
    }

    /// Compiles declared contracts keyed by status matcher.
    pub fn compile<'a, I, S>(service: &dyn SchemaService, contracts: I) -> Result<Self, CompileError>
    where
        I: IntoIterator<Item = (S, &'a ResponseContract)>,
        S: AsRef<str>,
    {
        let rules = contracts
            .into_iter()
            .map(|(status, contract)| OutputRule::compile(service, status.as_ref(), contract))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules)?)
    }

    /// The rules, in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[OutputRule] {
        &self.rules
    }

    /// The first rule matching `status`.
    #[must_use]
    pub fn find(&self, status: StatusCode) -> Option<&OutputRule> {
        self.rules.iter().find(|rule| rule.matches(status))
    }

    /// Validates a response against the rule matching its status.
    pub fn validate(&self, response: &mut ResponseData, locale: Option<&str>) -> Result<(), RouteError> {
        let Some(rule) = self.find(response.status()) else {
            return Err(RouteError::output_contract(UNCOVERED_STATUS, Vec::new()));
        };
        rule.validate(response, locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use sluice_schema::JsonSchemaService;

    fn contracts(value: Value) -> Vec<(String, ResponseContract)> {
        value
            .as_object()
            .unwrap()
            .iter()
            .map(|(status, contract)| (status.clone(), serde_json::from_value(contract.clone()).unwrap()))
            .collect()
    }

    fn compile(value: Value) -> Result<OutputValidator, CompileError> {
        let contracts = contracts(value);
        OutputValidator::compile(
            &JsonSchemaService::default(),
            contracts.iter().map(|(status, contract)| (status.as_str(), contract)),
        )
    }

    #[test]
    fn test_duplicate_status_rejected() {
        let err = OutputValidator::new(vec![
            OutputRule::new("200", None, None).unwrap(),
            OutputRule::new("200", None, None).unwrap(),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::OverlappingOutputRules {
                first: "200".into(),
                second: "200".into()
            }
        );
    }

    #[test]
    fn test_overlapping_ranges_rejected() {
        let err = compile(json!({"200-299": {}, "404": {}, "250": {}})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Config(ConfigError::OverlappingOutputRules { ref first, ref second })
                if first == "200-299" && second == "250"
        ));
    }

    #[test]
    fn test_first_matching_rule_validates() {
        let validator = compile(json!({
            "2xx": {"body": {"type": "object", "required": ["id"]}},
            "4xx,5xx": {"body": {"type": "object", "required": ["error"]}}
        }))
        .unwrap();
        assert_eq!(validator.rules().len(), 2);

        let mut created = ResponseData::default();
        created.set_status(StatusCode::CREATED);
        created.set_body(json!({"id": 1}));
        validator.validate(&mut created, None).unwrap();

        let mut failed = ResponseData::default();
        failed.set_status(StatusCode::BAD_REQUEST);
        failed.set_body(json!({"id": 1}));
        let err = validator.validate(&mut failed, None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_uncovered_status() {
        let validator = compile(json!({"200": {}})).unwrap();
        let mut redirect = ResponseData::default();
        redirect.set_status(StatusCode::FOUND);

        let err = validator.validate(&mut redirect, None).unwrap_err();
        assert_eq!(err.to_string(), UNCOVERED_STATUS);
        assert_eq!(err.error_code(), "OUTPUT_CONTRACT_VIOLATION");
    }
}
