// Schema Declarations
// Declarative data shapes and their JSON Schema translation

use schemars::generate::SchemaSettings;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

// ============================================================================
// Shape Model
// ============================================================================

/// A declared data shape
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    String,
    Number,
    Integer,
    Boolean,
    /// String restricted to the listed values
    Enum(Vec<String>),
    Array(Box<Shape>),
    Object(ObjectShape),
    /// Anything; also used for constructs we do not model ($ref, anyOf, ...)
    Any,
}

/// A field of an object shape
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub shape: Shape,
    pub optional: bool,
    pub description: Option<String>,
}

/// Object shape with fields kept in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    fields: Vec<(String, Field)>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field
    pub fn field(self, name: impl Into<String>, shape: Shape) -> Self {
        self.insert(name.into(), shape, false)
    }

    /// Add an optional field
    pub fn optional(self, name: impl Into<String>, shape: Shape) -> Self {
        self.insert(name.into(), shape, true)
    }

    /// Describe the most recently added field
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some((_, field)) = self.fields.last_mut() {
            field.description = Some(description.into());
        }
        self
    }

    fn insert(mut self, name: String, shape: Shape, optional: bool) -> Self {
        let field = Field {
            shape,
            optional,
            description: None,
        };
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = field,
            None => self.fields.push((name, field)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Shape {
    pub fn string() -> Self {
        Shape::String
    }

    pub fn number() -> Self {
        Shape::Number
    }

    pub fn integer() -> Self {
        Shape::Integer
    }

    pub fn boolean() -> Self {
        Shape::Boolean
    }

    pub fn any() -> Self {
        Shape::Any
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Shape::Enum(values.into_iter().map(Into::into).collect())
    }

    pub fn array(items: Shape) -> Self {
        Shape::Array(Box::new(items))
    }

    pub fn object(object: ObjectShape) -> Self {
        Shape::Object(object)
    }

    // ========================================================================
    // Translation
    // ========================================================================

    /// Translate to a JSON Schema value
    pub fn to_json_schema(&self) -> Value {
        match self {
            Shape::String => json!({ "type": "string" }),
            Shape::Number => json!({ "type": "number" }),
            Shape::Integer => json!({ "type": "integer" }),
            Shape::Boolean => json!({ "type": "boolean" }),
            Shape::Enum(values) => json!({ "type": "string", "enum": values }),
            Shape::Array(items) => json!({ "type": "array", "items": items.to_json_schema() }),
            Shape::Any => json!({}),
            Shape::Object(object) => {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (name, field) in object.fields() {
                    let mut schema = field.shape.to_json_schema();
                    if let (Some(desc), Some(obj)) = (&field.description, schema.as_object_mut()) {
                        obj.insert("description".to_string(), Value::String(desc.clone()));
                    }
                    properties.insert(name.to_string(), schema);
                    if !field.optional {
                        required.push(Value::String(name.to_string()));
                    }
                }

                let mut schema = Map::new();
                schema.insert("type".to_string(), json!("object"));
                schema.insert("properties".to_string(), Value::Object(properties));
                if !required.is_empty() {
                    schema.insert("required".to_string(), Value::Array(required));
                }
                schema.insert("additionalProperties".to_string(), json!(false));
                Value::Object(schema)
            }
        }
    }

    /// Translate a JSON Schema value back into a shape
    pub fn from_json_schema(schema: &Value) -> Shape {
        let Some(obj) = schema.as_object() else {
            return Shape::Any;
        };

        if let Some(values) = obj.get("enum").and_then(Value::as_array) {
            let strings: Option<Vec<String>> = values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            return match strings {
                Some(values) => Shape::Enum(values),
                None => Shape::Any,
            };
        }

        match schema_type(obj) {
            Some("string") => Shape::String,
            Some("number") => Shape::Number,
            Some("integer") => Shape::Integer,
            Some("boolean") => Shape::Boolean,
            Some("array") => Shape::Array(Box::new(
                obj.get("items").map(Shape::from_json_schema).unwrap_or(Shape::Any),
            )),
            Some("object") => Shape::Object(object_from_json_schema(obj)),
            None if obj.contains_key("properties") => Shape::Object(object_from_json_schema(obj)),
            _ => Shape::Any,
        }
    }
}

/// Resolve `type`, accepting the `["string", "null"]` form schemars emits for Option<T>
fn schema_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => {
            let mut non_null = types.iter().filter_map(Value::as_str).filter(|t| *t != "null");
            let first = non_null.next();
            if non_null.next().is_some() {
                None
            } else {
                first
            }
        }
        _ => None,
    }
}

fn object_from_json_schema(obj: &Map<String, Value>) -> ObjectShape {
    let required: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut shape = ObjectShape::new();
    if let Some(properties) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop) in properties {
            let field_shape = Shape::from_json_schema(prop);
            shape = if required.contains(&name.as_str()) {
                shape.field(name.clone(), field_shape)
            } else {
                shape.optional(name.clone(), field_shape)
            };
            if let Some(desc) = prop.get("description").and_then(Value::as_str) {
                shape = shape.describe(desc);
            }
        }
    }
    shape
}

/// Top-level property names of a JSON Schema object
pub fn field_names(schema: &Value) -> Vec<String> {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default()
}

// ============================================================================
// Schema Declaration
// ============================================================================

/// A user-authored schema slot: either a shape or an already translated JSON Schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDeclaration {
    Shape(Shape),
    JsonSchema(Value),
}

impl SchemaDeclaration {
    /// JSON Schema of a Rust type, subschemas inlined
    pub fn of<T: JsonSchema>() -> Self {
        let generator = SchemaSettings::draft07()
            .with(|settings| settings.inline_subschemas = true)
            .into_generator();
        SchemaDeclaration::JsonSchema(generator.into_root_schema_for::<T>().to_value())
    }

    pub fn to_json_schema(&self) -> Value {
        match self {
            SchemaDeclaration::Shape(shape) => shape.to_json_schema(),
            SchemaDeclaration::JsonSchema(value) => value.clone(),
        }
    }

    pub fn into_json_schema(self) -> Value {
        match self {
            SchemaDeclaration::Shape(shape) => shape.to_json_schema(),
            SchemaDeclaration::JsonSchema(value) => value,
        }
    }

    /// Shape view of this declaration
    pub fn to_shape(&self) -> Shape {
        match self {
            SchemaDeclaration::Shape(shape) => shape.clone(),
            SchemaDeclaration::JsonSchema(value) => Shape::from_json_schema(value),
        }
    }
}

impl From<Shape> for SchemaDeclaration {
    fn from(shape: Shape) -> Self {
        SchemaDeclaration::Shape(shape)
    }
}

impl From<ObjectShape> for SchemaDeclaration {
    fn from(object: ObjectShape) -> Self {
        SchemaDeclaration::Shape(Shape::Object(object))
    }
}

impl From<Value> for SchemaDeclaration {
    fn from(value: Value) -> Self {
        SchemaDeclaration::JsonSchema(value)
    }
}

impl Serialize for SchemaDeclaration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaDeclaration::Shape(shape) => shape.to_json_schema().serialize(serializer),
            SchemaDeclaration::JsonSchema(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for SchemaDeclaration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(SchemaDeclaration::JsonSchema)
    }
}
