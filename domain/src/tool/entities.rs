//! Tool domain entities

use crate::core::clock::now_millis;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Argument map passed to a tool (always a JSON object)
pub type Arguments = Map<String, Value>;

/// Default per-call execution timeout
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default tool category
pub const DEFAULT_CATEGORY: &str = "general";

/// The implementation family of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// In-process async function
    #[default]
    Function,
    /// External command run through a shell
    Shell,
    /// Action performed against a browser driver
    Browser,
    /// Proxy to a remote tool endpoint
    External,
}

impl ToolKind {
    pub fn as_str(&self) -> &str {
        match self {
            ToolKind::Function => "function",
            ToolKind::Shell => "shell",
            ToolKind::Browser => "browser",
            ToolKind::External => "external",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Primitive type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Whether a JSON value satisfies this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }

    /// Name of the JSON type of `value`, as reported in validation errors
    pub fn describe(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter specification for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter description
    pub description: String,
    /// Whether this parameter is required
    pub required: bool,
    /// Declared primitive type
    #[serde(rename = "type")]
    pub param_type: ParamType,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            param_type: ParamType::String,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }
}

/// Declarative description of a registered tool.
///
/// `mutating` and `requires_approval` are the static defaults; handlers may
/// refine both per invocation (see the application layer's `ToolHandler`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique name, the registry's primary key
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Parameter schema
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    #[serde(default)]
    pub kind: ToolKind,
    /// Free-form category used for discovery
    pub category: String,
    /// Per-call execution deadline
    #[serde(with = "duration_ms", rename = "timeout_ms")]
    pub timeout: Duration,
    /// Whether this tool may run concurrently with others
    pub parallel_safe: bool,
    /// Whether this tool changes external state
    pub mutating: bool,
    /// Whether invocations must pass the approval gate
    pub requires_approval: bool,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            kind: ToolKind::Function,
            category: DEFAULT_CATEGORY.to_string(),
            timeout: DEFAULT_TOOL_TIMEOUT,
            parallel_safe: true,
            mutating: false,
            requires_approval: false,
        }
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_kind(mut self, kind: ToolKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_parallel_safe(mut self, parallel_safe: bool) -> Self {
        self.parallel_safe = parallel_safe;
        self
    }

    pub fn with_mutating(mut self, mutating: bool) -> Self {
        self.mutating = mutating;
        self
    }

    pub fn with_requires_approval(mut self, requires_approval: bool) -> Self {
        self.requires_approval = requires_approval;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Function-calling schema: `{name, description, parameters}`
    pub fn to_function_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type.as_str(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Who is asking for an invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvocationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// Caller-specific extras, passed through to handlers untouched
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }
}

/// One immutable request to run a tool.
///
/// Fields are private; construct with [`ToolInvocation::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    call_id: String,
    tool_name: String,
    arguments: Arguments,
    context: InvocationContext,
    timestamp: u64,
}

impl ToolInvocation {
    pub fn new(
        tool_name: impl Into<String>,
        arguments: Arguments,
        context: InvocationContext,
    ) -> Self {
        Self {
            call_id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            arguments,
            context,
            timestamp: now_millis(),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    pub fn context(&self) -> &InvocationContext {
        &self.context
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn get_arg(&self, name: &str) -> Option<&Value> {
        self.arguments.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(|v| v.as_str())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.arguments.get(name).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.arguments.get(name).and_then(|v| v.as_bool())
    }

    pub fn require_string(&self, name: &str) -> Result<&str, String> {
        self.get_string(name)
            .ok_or_else(|| format!("Missing required parameter: {}", name))
    }
}
