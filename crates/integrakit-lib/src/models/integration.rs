// Integration definition models
// Generic over the schema slot type: declarations on input, JSON Schema once parsed

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::schema::SchemaDeclaration;

/// Tag metadata for users, conversations, and messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TagDefinition {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }
}

/// Whether the platform may create the entity, and which tags it must carry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreationDefinition {
    pub enabled: bool,
    pub required_tags: Vec<String>,
}

/// Identifier settings attached to the configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationIdentifier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_template_script: Option<String>,
}

/// Integration configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDefinition<S> {
    pub schema: S,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<ConfigurationIdentifier>,
}

/// An event the integration emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: S,
}

/// A schema wrapper used for action input/output and channel messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSection<S> {
    pub schema: S,
}

/// An action the bot can call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDefinition<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input: SchemaSection<S>,
    pub output: SchemaSection<S>,
}

/// Message-level tags of a channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTagsDefinition {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, TagDefinition>,
}

/// Conversation-level settings of a channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, TagDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation: Option<CreationDefinition>,
}

/// A messaging channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDefinition<S> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub messages: BTreeMap<String, SchemaSection<S>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageTagsDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationDefinition>,
}

impl<S> ChannelDefinition<S> {
    pub fn new() -> Self {
        Self {
            title: None,
            description: None,
            messages: BTreeMap::new(),
            message: None,
            conversation: None,
        }
    }

    pub fn message(mut self, name: impl Into<String>, schema: impl Into<S>) -> Self {
        self.messages.insert(
            name.into(),
            SchemaSection {
                schema: schema.into(),
            },
        );
        self
    }

    pub fn conversation(mut self, conversation: ConversationDefinition) -> Self {
        self.conversation = Some(conversation);
        self
    }
}

impl<S> Default for ChannelDefinition<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Who owns a piece of state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Integration,
    Conversation,
    User,
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateType::Integration => write!(f, "integration"),
            StateType::Conversation => write!(f, "conversation"),
            StateType::User => write!(f, "user"),
        }
    }
}

/// Persistent state slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDefinition<S> {
    #[serde(rename = "type")]
    pub state_type: StateType,
    pub schema: S,
}

/// User tags and creation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, TagDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation: Option<CreationDefinition>,
}

/// Scripts used to route incoming webhooks to an integration instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_script: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_handler_script: Option<String>,
}

/// Integration manifest, generic over the schema slot type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration<S> {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<ConfigurationDefinition<S>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<BTreeMap<String, EventDefinition<S>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<BTreeMap<String, ActionDefinition<S>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<BTreeMap<String, ChannelDefinition<S>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<BTreeMap<String, StateDefinition<S>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<IdentifierDefinition>,
}

/// User-authored definition input
pub type IntegrationDefinitionProps = Integration<SchemaDeclaration>;

fn map_entries<K: Ord, A, B>(
    entries: Option<BTreeMap<K, A>>,
    mut f: impl FnMut(A) -> B,
) -> Option<BTreeMap<K, B>> {
    entries.map(|m| m.into_iter().map(|(k, v)| (k, f(v))).collect())
}

impl<S> Integration<S> {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            title: None,
            description: None,
            icon: None,
            readme: None,
            configuration: None,
            events: None,
            actions: None,
            channels: None,
            states: None,
            user: None,
            secrets: None,
            identifier: None,
        }
    }

    /// Replace every schema slot with `f(slot)`, leaving all other fields intact
    pub fn map_schemas<T>(self, mut f: impl FnMut(S) -> T) -> Integration<T> {
        let configuration = self.configuration.map(|c| ConfigurationDefinition {
            schema: f(c.schema),
            identifier: c.identifier,
        });
        let events = map_entries(self.events, |e| EventDefinition {
            title: e.title,
            description: e.description,
            schema: f(e.schema),
        });
        let actions = map_entries(self.actions, |a| ActionDefinition {
            title: a.title,
            description: a.description,
            input: SchemaSection {
                schema: f(a.input.schema),
            },
            output: SchemaSection {
                schema: f(a.output.schema),
            },
        });
        let channels = map_entries(self.channels, |c| ChannelDefinition {
            title: c.title,
            description: c.description,
            messages: c
                .messages
                .into_iter()
                .map(|(name, m)| (name, SchemaSection { schema: f(m.schema) }))
                .collect(),
            message: c.message,
            conversation: c.conversation,
        });
        let states = map_entries(self.states, |s| StateDefinition {
            state_type: s.state_type,
            schema: f(s.schema),
        });

        Integration {
            name: self.name,
            version: self.version,
            title: self.title,
            description: self.description,
            icon: self.icon,
            readme: self.readme,
            configuration,
            events,
            actions,
            channels,
            states,
            user: self.user,
            secrets: self.secrets,
            identifier: self.identifier,
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn readme(mut self, readme: impl Into<String>) -> Self {
        self.readme = Some(readme.into());
        self
    }

    pub fn configuration(mut self, schema: impl Into<S>) -> Self {
        self.configuration = Some(ConfigurationDefinition {
            schema: schema.into(),
            identifier: None,
        });
        self
    }

    pub fn configuration_definition(mut self, configuration: ConfigurationDefinition<S>) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn event(mut self, name: impl Into<String>, schema: impl Into<S>) -> Self {
        self.events.get_or_insert_with(BTreeMap::new).insert(
            name.into(),
            EventDefinition {
                title: None,
                description: None,
                schema: schema.into(),
            },
        );
        self
    }

    pub fn event_definition(mut self, name: impl Into<String>, event: EventDefinition<S>) -> Self {
        self.events
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), event);
        self
    }

    pub fn action(
        mut self,
        name: impl Into<String>,
        input: impl Into<S>,
        output: impl Into<S>,
    ) -> Self {
        self.actions.get_or_insert_with(BTreeMap::new).insert(
            name.into(),
            ActionDefinition {
                title: None,
                description: None,
                input: SchemaSection {
                    schema: input.into(),
                },
                output: SchemaSection {
                    schema: output.into(),
                },
            },
        );
        self
    }

    pub fn channel(mut self, name: impl Into<String>, channel: ChannelDefinition<S>) -> Self {
        self.channels
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), channel);
        self
    }

    pub fn state(
        mut self,
        name: impl Into<String>,
        state_type: StateType,
        schema: impl Into<S>,
    ) -> Self {
        self.states.get_or_insert_with(BTreeMap::new).insert(
            name.into(),
            StateDefinition {
                state_type,
                schema: schema.into(),
            },
        );
        self
    }

    pub fn user(mut self, user: UserDefinition) -> Self {
        self.user = Some(user);
        self
    }

    pub fn secret(mut self, name: impl Into<String>) -> Self {
        self.secrets.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    pub fn identifier(mut self, identifier: IdentifierDefinition) -> Self {
        self.identifier = Some(identifier);
        self
    }
}
