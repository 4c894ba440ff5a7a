//! update_plan - task checklist tracking.

use std::fmt;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::SchemaTool;
use super::context::ExecutionContext;
use crate::types::ToolResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PlanItem {
    /// What needs to be done
    pub description: String,
    /// Item status
    #[serde(default)]
    pub status: PlanStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// Short title of the overall task
    pub title: String,
    /// Ordered checklist items
    #[serde(default)]
    pub items: Vec<PlanItem>,
}

impl Plan {
    pub fn completed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.status == PlanStatus::Completed)
            .count()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}/{})", self.title, self.completed(), self.items.len())?;
        for item in &self.items {
            let icon = match item.status {
                PlanStatus::Pending => "○",
                PlanStatus::InProgress => "◐",
                PlanStatus::Completed => "●",
            };
            writeln!(f, "  {} {}", icon, item.description)?;
        }
        Ok(())
    }
}

/// Holds the latest plan the model published.
#[derive(Debug, Default)]
pub struct UpdatePlanTool {
    plan: RwLock<Option<Plan>>,
}

impl UpdatePlanTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Plan> {
        self.plan
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        *self.plan.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[async_trait]
impl SchemaTool for UpdatePlanTool {
    type Input = Plan;

    const NAME: &'static str = "update_plan";
    const DESCRIPTION: &'static str = "Create or update a task plan/checklist for multi-step work. \
        Send the full list every time; each item has a description and a status of \
        'pending', 'in_progress' or 'completed'.";

    async fn handle(&self, input: Plan, _context: &ExecutionContext) -> ToolResult {
        let message = format!("Plan updated: {} ({} items)", input.title, input.items.len());
        tracing::debug!(title = %input.title, items = input.items.len(), "Plan updated");
        *self.plan.write().unwrap_or_else(PoisonError::into_inner) = Some(input);
        ToolResult::success(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use crate::tools::testing::helpers::TestContext;

    #[tokio::test]
    async fn test_update_plan() {
        let ctx = TestContext::new();
        let tool = UpdatePlanTool::new();
        assert!(tool.current().is_none());

        let result = tool
            .execute(
                serde_json::json!({
                    "title": "Refactor parser",
                    "items": [
                        {"description": "Read the code", "status": "completed"},
                        {"description": "Split the module", "status": "in_progress"},
                        {"description": "Run tests"}
                    ]
                }),
                &ctx.context,
            )
            .await;

        assert_eq!(result.text(), "Plan updated: Refactor parser (3 items)");
        let plan = tool.current().unwrap();
        assert_eq!(plan.items[2].status, PlanStatus::Pending);
        assert_eq!(plan.completed(), 1);

        let rendered = plan.to_string();
        assert!(rendered.starts_with("Refactor parser (1/3)"));
        assert!(rendered.contains("◐ Split the module"));

        tool.clear();
        assert!(tool.current().is_none());
    }

    #[tokio::test]
    async fn test_plan_replaced_wholesale() {
        let ctx = TestContext::new();
        let tool = UpdatePlanTool::new();
        for title in ["first", "second"] {
            tool.execute(
                serde_json::json!({"title": title, "items": []}),
                &ctx.context,
            )
            .await;
        }
        assert_eq!(tool.current().unwrap().title, "second");
    }
}
