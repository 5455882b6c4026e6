use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::registry::Tool;

/// Boundary to the external calendar system. The engine only needs the three
/// operations the assistant can request; everything behind them (auth,
/// transport, the calendar provider itself) belongs to the collaborator.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn add_event(&self, request: AddEventRequest) -> Result<Value>;
    async fn list_events(&self, request: ListEventsRequest) -> Result<Value>;
    async fn update_or_cancel_event(&self, request: UpdateOrCancelEventRequest) -> Result<Value>;
}

/// Stand-in used until a real calendar backend is wired up; every operation
/// reports itself as unconfigured so the assistant can tell the user.
#[derive(Default)]
pub struct NoopCalendarApi;

#[async_trait]
impl CalendarApi for NoopCalendarApi {
    async fn add_event(&self, _request: AddEventRequest) -> Result<Value> {
        Ok(json!({"status": "unconfigured", "detail": "no calendar backend is connected"}))
    }

    async fn list_events(&self, _request: ListEventsRequest) -> Result<Value> {
        Ok(json!({"status": "unconfigured", "events": []}))
    }

    async fn update_or_cancel_event(&self, _request: UpdateOrCancelEventRequest) -> Result<Value> {
        Ok(json!({"status": "unconfigured", "detail": "no calendar backend is connected"}))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AddEventRequest {
    pub event_summary: String,
    pub event_location: String,
    pub event_description: String,
    pub start_time: String,
    pub end_time: String,
    pub start_time_zone: String,
    pub end_time_zone: String,
}

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_max_results() -> u32 {
    10
}

fn default_listing_timezone() -> String {
    "UTC".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListEventsRequest {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default = "default_listing_timezone")]
    pub timezone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateOrCancelEventRequest {
    pub calendar_id: String,
    pub event_id: String,
    #[serde(default)]
    pub update_body: Option<Value>,
}

pub struct AddEventTool {
    calendar: Arc<dyn CalendarApi>,
}

impl AddEventTool {
    pub fn new(calendar: Arc<dyn CalendarApi>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for AddEventTool {
    fn name(&self) -> &'static str {
        "add_calendar_event"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "add_calendar_event",
                "description": "Add an event to the calendar",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "event_summary": {"type": "string"},
                        "event_location": {"type": "string"},
                        "event_description": {"type": "string"},
                        "start_time": {"type": "string"},
                        "end_time": {"type": "string"},
                        "start_time_zone": {"type": "string"},
                        "end_time_zone": {"type": "string"}
                    },
                    "required": [
                        "event_summary",
                        "event_location",
                        "event_description",
                        "start_time",
                        "end_time",
                        "start_time_zone",
                        "end_time_zone"
                    ]
                }
            }
        })
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let request: AddEventRequest = serde_json::from_value(Value::Object(args))?;
        self.calendar.add_event(request).await
    }
}

pub struct ListEventsTool {
    calendar: Arc<dyn CalendarApi>,
}

impl ListEventsTool {
    pub fn new(calendar: Arc<dyn CalendarApi>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for ListEventsTool {
    fn name(&self) -> &'static str {
        "list_events"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "list_events",
                "description": "List past and upcoming events from the calendar",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "calendar_id": {"type": "string"},
                        "max_results": {"type": "integer"},
                        "start_time": {
                            "type": "string",
                            "format": "date-time",
                            "description": "Start time in ISO 8601 format (YYYY-MM-DDTHH:MM:SS)"
                        },
                        "end_time": {
                            "type": "string",
                            "format": "date-time",
                            "description": "End time in ISO 8601 format (YYYY-MM-DDTHH:MM:SS)"
                        },
                        "timezone": {
                            "type": "string",
                            "description": "Timezone in which the start and end times are specified"
                        }
                    },
                    "required": ["calendar_id", "max_results"]
                }
            }
        })
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let request: ListEventsRequest = serde_json::from_value(Value::Object(args))?;
        self.calendar.list_events(request).await
    }
}

pub struct UpdateOrCancelEventTool {
    calendar: Arc<dyn CalendarApi>,
}

impl UpdateOrCancelEventTool {
    pub fn new(calendar: Arc<dyn CalendarApi>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for UpdateOrCancelEventTool {
    fn name(&self) -> &'static str {
        "update_or_cancel_event"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": "update_or_cancel_event",
                "description": "Update or cancel an event in the calendar",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "calendar_id": {"type": "string"},
                        "event_id": {"type": "string"},
                        "update_body": {"type": "object"}
                    },
                    "required": ["calendar_id", "event_id"]
                }
            }
        })
    }

    async fn invoke(&self, args: Map<String, Value>) -> Result<Value> {
        let request: UpdateOrCancelEventRequest = serde_json::from_value(Value::Object(args))?;
        self.calendar.update_or_cancel_event(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    use super::{
        AddEventRequest, AddEventTool, CalendarApi, ListEventsRequest, ListEventsTool,
        UpdateOrCancelEventRequest,
    };
    use crate::registry::Tool;

    #[derive(Default)]
    struct RecordingCalendar {
        added: Mutex<Vec<AddEventRequest>>,
        listed: Mutex<Vec<ListEventsRequest>>,
    }

    #[async_trait::async_trait]
    impl CalendarApi for RecordingCalendar {
        async fn add_event(&self, request: AddEventRequest) -> anyhow::Result<Value> {
            self.added.lock().await.push(request);
            Ok(json!({"status": "confirmed"}))
        }

        async fn list_events(&self, request: ListEventsRequest) -> anyhow::Result<Value> {
            self.listed.lock().await.push(request);
            Ok(json!({"events": []}))
        }

        async fn update_or_cancel_event(
            &self,
            _request: UpdateOrCancelEventRequest,
        ) -> anyhow::Result<Value> {
            Ok(json!({"status": "cancelled"}))
        }
    }

    #[tokio::test]
    async fn add_event_decodes_required_fields() {
        let calendar = Arc::new(RecordingCalendar::default());
        let tool = AddEventTool::new(calendar.clone());

        let args = json!({
            "event_summary": "Standup",
            "event_location": "Meet",
            "event_description": "Daily sync",
            "start_time": "2026-08-06T09:00:00",
            "end_time": "2026-08-06T09:15:00",
            "start_time_zone": "America/Los_Angeles",
            "end_time_zone": "America/Los_Angeles"
        });

        let result = tool
            .invoke(args.as_object().expect("object literal").clone())
            .await
            .expect("invoke");
        assert_eq!(result, json!({"status": "confirmed"}));

        let added = calendar.added.lock().await;
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].event_summary, "Standup");
    }

    #[tokio::test]
    async fn add_event_rejects_missing_required_fields() {
        let tool = AddEventTool::new(Arc::new(RecordingCalendar::default()));
        let args = json!({"event_summary": "Standup"});

        let error = tool
            .invoke(args.as_object().expect("object literal").clone())
            .await
            .expect_err("missing fields");
        assert!(error.to_string().contains("missing field"));
    }

    #[tokio::test]
    async fn list_events_applies_documented_defaults() {
        let calendar = Arc::new(RecordingCalendar::default());
        let tool = ListEventsTool::new(calendar.clone());

        tool.invoke(serde_json::Map::new()).await.expect("invoke with empty args");

        let listed = calendar.listed.lock().await;
        assert_eq!(listed[0].calendar_id, "primary");
        assert_eq!(listed[0].max_results, 10);
        assert_eq!(listed[0].timezone, "UTC");
        assert_eq!(listed[0].start_time, None);
    }
}
