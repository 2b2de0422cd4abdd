//! Built-in tool definitions.

use crate::models::{ToolCategory, ToolDefinition};

/// The default tool set: an always-on core plus opt-in extensions.
pub fn default_catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::always_on("memory", "Store and recall long-term memories"),
        ToolDefinition::always_on("time", "Current date, time and timezone"),
        ToolDefinition::on_demand(
            "web_search",
            "Search the web for current information",
            ToolCategory::Search,
            &["search", "look up", "google", "find out", "latest news"],
        ),
        ToolDefinition::on_demand(
            "weather",
            "Current conditions and forecasts",
            ToolCategory::Information,
            &["weather", "forecast", "temperature", "rain", "sunny"],
        ),
        ToolDefinition::on_demand(
            "browser",
            "Open and read web pages",
            ToolCategory::Browser,
            &["website", "web page", "browse", "url", "http"],
        ),
        ToolDefinition::on_demand(
            "calendar",
            "Read and create calendar events",
            ToolCategory::Productivity,
            &["calendar", "schedule", "meeting", "appointment"],
        ),
        ToolDefinition::on_demand(
            "reminders",
            "Set and list reminders",
            ToolCategory::Productivity,
            &["remind", "alarm", "don't forget", "notify me"],
        ),
        ToolDefinition::on_demand(
            "shopping",
            "Product lookup, prices and shopping lists",
            ToolCategory::Shopping,
            &["buy", "order", "shopping", "price", "cart"],
        ),
        ToolDefinition::on_demand(
            "maps",
            "Places, routes and directions",
            ToolCategory::Navigation,
            &["directions", "map", "route", "nearby", "how far"],
        ),
    ]
}
