// Manifest Schema
// The fixed JSON Schema every integration manifest is validated against

use jsonschema::Validator;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use crate::error::{DefinitionError, DefinitionResult, ValidationIssue};

/// Manifest versions the platform accepts
pub const MANIFEST_VERSIONS: &[&str] = &["0.0.1", "0.2.0"];

static MANIFEST_SCHEMA: Lazy<Value> = Lazy::new(build_manifest_schema);

static MANIFEST_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| {
    jsonschema::draft7::new(&MANIFEST_SCHEMA).map_err(|e| e.to_string())
});

fn build_manifest_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Integration manifest",
        "type": "object",
        "required": ["name", "version"],
        "additionalProperties": false,
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "version": { "type": "string", "enum": MANIFEST_VERSIONS },
            "title": { "type": "string" },
            "description": { "type": "string" },
            "icon": { "type": "string" },
            "readme": { "type": "string" },
            "configuration": {
                "type": "object",
                "required": ["schema"],
                "additionalProperties": false,
                "properties": {
                    "schema": { "$ref": "#/definitions/objectSchema" },
                    "identifier": {
                        "type": "object",
                        "additionalProperties": false,
                        "properties": {
                            "required": { "type": "boolean" },
                            "linkTemplateScript": { "type": "string" }
                        }
                    }
                }
            },
            "events": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["schema"],
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "schema": { "$ref": "#/definitions/objectSchema" }
                    }
                }
            },
            "actions": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["input", "output"],
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "input": { "$ref": "#/definitions/schemaSection" },
                        "output": { "$ref": "#/definitions/schemaSection" }
                    }
                }
            },
            "channels": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["messages"],
                    "additionalProperties": false,
                    "properties": {
                        "title": { "type": "string" },
                        "description": { "type": "string" },
                        "messages": {
                            "type": "object",
                            "additionalProperties": { "$ref": "#/definitions/schemaSection" }
                        },
                        "message": {
                            "type": "object",
                            "additionalProperties": false,
                            "properties": {
                                "tags": { "$ref": "#/definitions/tags" }
                            }
                        },
                        "conversation": {
                            "type": "object",
                            "additionalProperties": false,
                            "properties": {
                                "tags": { "$ref": "#/definitions/tags" },
                                "creation": { "$ref": "#/definitions/creation" }
                            }
                        }
                    }
                }
            },
            "states": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["type", "schema"],
                    "additionalProperties": false,
                    "properties": {
                        "type": { "type": "string", "enum": ["integration", "conversation", "user"] },
                        "schema": { "$ref": "#/definitions/objectSchema" }
                    }
                }
            },
            "user": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "tags": { "$ref": "#/definitions/tags" },
                    "creation": { "$ref": "#/definitions/creation" }
                }
            },
            "secrets": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 },
                "uniqueItems": true
            },
            "identifier": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "extractScript": { "type": "string" },
                    "fallbackHandlerScript": { "type": "string" }
                }
            }
        },
        "definitions": {
            "objectSchema": {
                "type": "object",
                "required": ["type"],
                "properties": {
                    "type": { "const": "object" }
                }
            },
            "schemaSection": {
                "type": "object",
                "required": ["schema"],
                "additionalProperties": false,
                "properties": {
                    "schema": { "$ref": "#/definitions/objectSchema" }
                }
            },
            "tag": {
                "type": "object",
                "additionalProperties": false,
                "properties": {
                    "title": { "type": "string" },
                    "description": { "type": "string" }
                }
            },
            "tags": {
                "type": "object",
                "additionalProperties": { "$ref": "#/definitions/tag" }
            },
            "creation": {
                "type": "object",
                "required": ["enabled", "requiredTags"],
                "additionalProperties": false,
                "properties": {
                    "enabled": { "type": "boolean" },
                    "requiredTags": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
}

/// The static manifest JSON Schema
pub fn manifest_schema() -> &'static Value {
    &MANIFEST_SCHEMA
}

/// Compile an arbitrary JSON Schema, labelling failures with `target`
pub fn compile_schema(target: &str, schema: &Value) -> DefinitionResult<Validator> {
    jsonschema::validator_for(schema).map_err(|e| DefinitionError::InvalidSchema {
        target: target.to_string(),
        message: e.to_string(),
    })
}

/// Collect every violation of `validator` on `instance`
pub fn collect_issues(validator: &Validator, instance: &Value) -> Vec<ValidationIssue> {
    validator
        .iter_errors(instance)
        .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
        .collect()
}

/// Validate a manifest against the fixed schema
pub fn validate_manifest(manifest: &Value) -> Result<(), Vec<ValidationIssue>> {
    let validator = match MANIFEST_VALIDATOR.as_ref() {
        Ok(v) => v,
        Err(e) => return Err(vec![ValidationIssue::new("/", e.clone())]),
    };

    let issues = collect_issues(validator, manifest);
    if issues.is_empty() {
        Ok(())
    } else {
        log::debug!("Manifest failed validation with {} issue(s)", issues.len());
        Err(issues)
    }
}
