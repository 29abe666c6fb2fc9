// Integration Definition
// Translates schema declarations, validates the merged manifest, and exposes the parsed result

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Deref;

use crate::error::{DefinitionError, DefinitionResult, ValidationIssue};
use crate::models::integration::{CreationDefinition, Integration, IntegrationDefinitionProps, TagDefinition};
use crate::services::manifest_schema::{collect_issues, compile_schema, validate_manifest};

/// Parsed, validated, immutable integration definition
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrationDefinition {
    inner: Integration<Value>,
}

impl IntegrationDefinition {
    /// Build from user-authored props
    pub fn new(props: IntegrationDefinitionProps) -> DefinitionResult<Self> {
        log::debug!("Building integration definition \"{}\"", props.name);
        let translated = props.map_schemas(|decl| decl.into_json_schema());
        let manifest = serde_json::to_value(&translated)?;
        Self::from_manifest(manifest)
    }

    /// Build from an already translated manifest
    pub fn from_manifest(manifest: Value) -> DefinitionResult<Self> {
        validate_manifest(&manifest).map_err(|issues| DefinitionError::Validation { issues })?;

        let inner: Integration<Value> = serde_json::from_value(manifest)?;

        let issues = check_tag_references(&inner);
        if !issues.is_empty() {
            return Err(DefinitionError::Validation { issues });
        }

        log::info!(
            "Integration definition \"{}\" v{} is valid",
            inner.name,
            inner.version
        );
        Ok(Self { inner })
    }

    /// Manifest JSON
    pub fn to_manifest(&self) -> DefinitionResult<Value> {
        Ok(serde_json::to_value(&self.inner)?)
    }

    pub fn into_inner(self) -> Integration<Value> {
        self.inner
    }

    // ========================================================================
    // Runtime payload validation
    // ========================================================================

    pub fn validate_configuration(&self, payload: &Value) -> DefinitionResult<()> {
        let schema = self
            .inner
            .configuration
            .as_ref()
            .map(|c| &c.schema)
            .ok_or_else(|| unknown("section", "configuration"))?;
        validate_payload("configuration", schema, payload)
    }

    /// Validate then deserialize the configuration
    pub fn parse_configuration<T: DeserializeOwned>(&self, payload: &Value) -> DefinitionResult<T> {
        self.validate_configuration(payload)?;
        Ok(serde_json::from_value(payload.clone())?)
    }

    pub fn validate_event(&self, name: &str, payload: &Value) -> DefinitionResult<()> {
        let event = lookup(&self.inner.events, "event", name)?;
        validate_payload(&format!("event \"{}\"", name), &event.schema, payload)
    }

    pub fn validate_action_input(&self, name: &str, payload: &Value) -> DefinitionResult<()> {
        let action = lookup(&self.inner.actions, "action", name)?;
        validate_payload(
            &format!("action \"{}\" input", name),
            &action.input.schema,
            payload,
        )
    }

    pub fn validate_action_output(&self, name: &str, payload: &Value) -> DefinitionResult<()> {
        let action = lookup(&self.inner.actions, "action", name)?;
        validate_payload(
            &format!("action \"{}\" output", name),
            &action.output.schema,
            payload,
        )
    }

    pub fn validate_state(&self, name: &str, payload: &Value) -> DefinitionResult<()> {
        let state = lookup(&self.inner.states, "state", name)?;
        validate_payload(&format!("state \"{}\"", name), &state.schema, payload)
    }

    pub fn validate_message(&self, channel: &str, message: &str, payload: &Value) -> DefinitionResult<()> {
        let def = lookup(&self.inner.channels, "channel", channel)?;
        let message_def = def.messages.get(message).ok_or_else(|| DefinitionError::UnknownEntry {
            section: format!("message type of channel \"{}\"", channel),
            name: message.to_string(),
        })?;
        validate_payload(
            &format!("message \"{}\" of channel \"{}\"", message, channel),
            &message_def.schema,
            payload,
        )
    }
}

impl Deref for IntegrationDefinition {
    type Target = Integration<Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl TryFrom<IntegrationDefinitionProps> for IntegrationDefinition {
    type Error = DefinitionError;

    fn try_from(props: IntegrationDefinitionProps) -> Result<Self, Self::Error> {
        Self::new(props)
    }
}

impl serde::Serialize for IntegrationDefinition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.serialize(serializer)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn unknown(section: &str, name: &str) -> DefinitionError {
    DefinitionError::UnknownEntry {
        section: section.to_string(),
        name: name.to_string(),
    }
}

fn lookup<'a, T>(
    entries: &'a Option<BTreeMap<String, T>>,
    section: &str,
    name: &str,
) -> DefinitionResult<&'a T> {
    entries
        .as_ref()
        .and_then(|m| m.get(name))
        .ok_or_else(|| unknown(section, name))
}

fn validate_payload(target: &str, schema: &Value, payload: &Value) -> DefinitionResult<()> {
    let validator = compile_schema(target, schema)?;
    let issues = collect_issues(&validator, payload);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(DefinitionError::Payload {
            target: target.to_string(),
            issues,
        })
    }
}

/// `creation.requiredTags` may only name tags declared alongside it
fn check_tag_references(def: &Integration<Value>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if let Some(user) = &def.user {
        check_creation(&mut issues, "/user", user.tags.as_ref(), user.creation.as_ref());
    }

    if let Some(channels) = &def.channels {
        for (name, channel) in channels {
            if let Some(conversation) = &channel.conversation {
                check_creation(
                    &mut issues,
                    &format!("/channels/{}/conversation", escape_pointer(name)),
                    conversation.tags.as_ref(),
                    conversation.creation.as_ref(),
                );
            }
        }
    }

    issues
}

fn check_creation(
    issues: &mut Vec<ValidationIssue>,
    base: &str,
    tags: Option<&BTreeMap<String, TagDefinition>>,
    creation: Option<&CreationDefinition>,
) {
    let Some(creation) = creation else {
        return;
    };
    for (i, tag) in creation.required_tags.iter().enumerate() {
        let declared = tags.map(|t| t.contains_key(tag)).unwrap_or(false);
        if !declared {
            issues.push(ValidationIssue::new(
                format!("{}/creation/requiredTags/{}", base, i),
                format!("required tag \"{}\" is not declared in {}/tags", tag, base),
            ));
        }
    }
}

/// RFC 6901 escaping of a pointer segment
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
