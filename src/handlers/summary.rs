//! Status summary handler for the todo MCP server

use super::tool_error;
use crate::TodoServerHandler;
use crate::formatting::format_status;
use mcp_attr::Result as McpResult;

/// Default look-ahead for the per-day due date breakdown
const DEFAULT_PERIOD_DAYS: u32 = 7;

impl TodoServerHandler {
    /// Status line, notification message, titles per category and an upcoming
    /// per-day breakdown.
    pub async fn handle_status_summary(&self, days: Option<u32>) -> McpResult<String> {
        let mut service = self.service.lock().unwrap();
        let notifications = service.notifications().map_err(tool_error)?;
        drop(service);

        let mut result = format_status(&notifications);
        result.push_str(&format!("\nPriority: {}\n", notifications.priority()));

        let days = days.unwrap_or(DEFAULT_PERIOD_DAYS);
        let per_day = notifications
            .summary_for_period(days)
            .map_err(|e| tool_error(e.into()))?;
        result.push_str(&format!("\nDue in the next {} day(s):\n", days));
        for (date, count) in per_day {
            result.push_str(&format!("  {} {}\n", date.format("%Y-%m-%d %a"), count));
        }
        Ok(result)
    }
}
