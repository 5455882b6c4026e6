use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A locally callable operation the remote assistant may request. `schema()`
/// is the function declaration advertised when the assistant definition is
/// created; `invoke` receives the structurally decoded keyword arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn schema(&self) -> Value;
    async fn invoke(&self, args: Map<String, Value>) -> Result<Value>;
}

/// Fixed name-to-operation mapping built once at startup and read-only
/// afterwards. Unknown names are a normal lookup miss, not an error.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|tool| tool.as_ref())
    }

    /// Function declarations for assistant creation, sorted by tool name so
    /// the rendered definition is stable across runs.
    pub fn schemas(&self) -> Vec<Value> {
        let mut entries: Vec<(&str, Value)> =
            self.tools.values().map(|tool| (tool.name(), tool.schema())).collect();
        entries.sort_by_key(|(name, _)| *name);
        entries.into_iter().map(|(_, schema)| schema).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
