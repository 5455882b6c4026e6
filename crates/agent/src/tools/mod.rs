pub mod calendar;
pub mod chat;

use std::sync::Arc;

use sundial_openai::AssistantsApi;

pub use calendar::{
    AddEventRequest, AddEventTool, CalendarApi, ListEventsRequest, ListEventsTool,
    NoopCalendarApi, UpdateOrCancelEventRequest, UpdateOrCancelEventTool,
};
pub use chat::ChatFallbackTool;

use crate::registry::ToolRegistry;

/// The fixed tool set: the three calendar operations plus the plain chat
/// fallback. Built once at startup; the registry is read-only afterwards.
pub fn default_registry(
    api: Arc<dyn AssistantsApi>,
    calendar: Arc<dyn CalendarApi>,
    chat_model: &str,
) -> ToolRegistry {
    let mut registry = ToolRegistry::default();
    registry.register(AddEventTool::new(calendar.clone()));
    registry.register(ListEventsTool::new(calendar.clone()));
    registry.register(UpdateOrCancelEventTool::new(calendar));
    registry.register(ChatFallbackTool::new(api, chat_model));
    registry
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{default_registry, NoopCalendarApi};
    use crate::test_support::ScriptedAssistantsApi;

    #[test]
    fn default_registry_carries_the_full_tool_set() {
        let registry = default_registry(
            Arc::new(ScriptedAssistantsApi::default()),
            Arc::new(NoopCalendarApi),
            "gpt-3.5-turbo",
        );

        assert_eq!(registry.len(), 4);
        assert!(registry.resolve("add_calendar_event").is_some());
        assert!(registry.resolve("list_events").is_some());
        assert!(registry.resolve("update_or_cancel_event").is_some());
        assert!(registry.resolve("chat").is_some());

        let schemas = registry.schemas();
        let names: Vec<_> = schemas
            .iter()
            .map(|schema| schema["function"]["name"].as_str().expect("name"))
            .collect();
        assert_eq!(names, vec!["add_calendar_event", "chat", "list_events", "update_or_cancel_event"]);
    }
}
