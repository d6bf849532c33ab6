//! JSON Schema validator over the request's JSON view
//! (`{method, path, query, params, body}`).

use crate::errors::SchemaError;
use action_types::{ProtoRequest, ValidationFailure, Validator, Violation};
use async_trait::async_trait;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::sync::Arc;

pub struct JsonSchemaValidator {
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    /// Compiles `schema` as Draft 7.
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|err| SchemaError::Compile(err.to_string()))?;
        Ok(Self { compiled })
    }

    pub fn into_validator(self) -> Arc<dyn Validator> {
        Arc::new(self)
    }

    /// Checks a bare JSON instance, independent of any request.
    pub fn check(&self, instance: &Value) -> Result<(), ValidationFailure> {
        match self.compiled.validate(instance) {
            Ok(()) => Ok(()),
            Err(errors) => {
                let details = errors
                    .map(|err| Violation {
                        path: err.instance_path.to_string(),
                        rule: rule_keyword(&err.schema_path.to_string()),
                        message: err.to_string(),
                    })
                    .collect();
                Err(ValidationFailure::from_violations(details))
            }
        }
    }
}

#[async_trait]
impl Validator for JsonSchemaValidator {
    async fn validate(&self, req: &dyn ProtoRequest) -> Result<(), ValidationFailure> {
        self.check(&req.as_value())
    }
}

/// The failing keyword is the last segment of the schema path,
/// e.g. `/properties/body/required` -> `required`.
fn rule_keyword(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("schema")
        .to_string()
}
