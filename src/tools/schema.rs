//! 工具参数类型与 JSON Schema 生成（schemars）
//!
//! 四个工具的参数结构既用于反序列化 Planner 给出的 arguments，也用于生成发送给 Planner 的 schema，
//! 两者始终一致。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::memory::TaskId;
use crate::tools::ToolName;

/// search 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// Search query
    pub query: String,
    /// Number of results (default 3)
    #[serde(default, deserialize_with = "lenient_top_k")]
    #[schemars(with = "Option<u32>")]
    pub top_k: Option<usize>,
}

/// add_task 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddTaskArgs {
    /// What this task will research
    pub description: String,
    /// Task IDs this task must wait for
    #[serde(default)]
    pub depends_on: Vec<TaskId>,
}

/// complete_task 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CompleteTaskArgs {
    /// ID of the task
    pub task_id: TaskId,
    /// Summary of what was found
    pub result: String,
}

/// finish 参数
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FinishArgs {
    /// Final answer based on retrieved information
    pub answer: String,
}

/// top_k 接受正整数及整数值浮点（如 2.0）；其余情况视为未指定，由派发器套用默认值
fn lenient_top_k<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let n = raw.as_u64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f >= 1.0)
            .map(|f| f as u64)
    });
    Ok(n.filter(|n| *n > 0).map(|n| n as usize))
}

/// 发送给 Planner 的单个工具描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    /// OpenAI function calling 格式
    pub fn to_openai_tool(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

fn parameters_of<T: JsonSchema>() -> Value {
    let mut v = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(obj) = v.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    v
}

/// 固定的 4 个工具 schema，顺序固定
pub fn tool_schemas() -> Vec<ToolSchema> {
    ToolName::ALL
        .iter()
        .map(|name| {
            let parameters = match name {
                ToolName::Search => parameters_of::<SearchArgs>(),
                ToolName::AddTask => parameters_of::<AddTaskArgs>(),
                ToolName::CompleteTask => parameters_of::<CompleteTaskArgs>(),
                ToolName::Finish => parameters_of::<FinishArgs>(),
            };
            ToolSchema {
                name: name.as_str().to_string(),
                description: name.description().to_string(),
                parameters,
            }
        })
        .collect()
}
