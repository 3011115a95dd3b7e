//! Checklist rendering: completed lines with who/when, pending items as
//! actionable buttons.

use eyre::Result;
use gestipc_db::DbPool;
use gestipc_db::models::{DbChecklistItem, DbScheduledTask};
use gestipc_db::repositories::{task as task_repo, volunteer as volunteer_repo};
use gestipc_telegram::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::handlers::commands::format_time;

/// One checklist row with its completer's display name resolved.
pub struct ChecklistLine {
    pub item: DbChecklistItem,
    pub done_by_name: Option<String>,
}

/// Pure rendering of the checklist view; the keyboard is `None` once
/// nothing is pending.
pub fn render_checklist(
    task_name: &str,
    lines: &[ChecklistLine],
) -> (String, Option<InlineKeyboardMarkup>) {
    let mut completed_lines = Vec::new();
    let mut pending_buttons = Vec::new();

    for line in lines {
        if line.item.done {
            let name = line.done_by_name.as_deref().unwrap_or("?");
            let time = line
                .item
                .done_at
                .map(format_time)
                .unwrap_or_default();
            completed_lines.push(format!("✅ {} - {} ({})", line.item.description, name, time));
        } else {
            pending_buttons.push(InlineKeyboardButton::callback(
                line.item.description.clone(),
                format!("chk:{}", line.item.id),
            ));
        }
    }

    let mut text = format!("Checklist: {task_name}\n");
    if !completed_lines.is_empty() {
        text.push('\n');
        text.push_str(&completed_lines.join("\n"));
    }

    let keyboard = if pending_buttons.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::single_column(pending_buttons))
    };

    (text, keyboard)
}

/// Load a task's checklist and render it.
pub async fn build_checklist_message(
    pool: &DbPool,
    task: &DbScheduledTask,
) -> Result<(String, Option<InlineKeyboardMarkup>)> {
    let items = task_repo::list_checklist_items(pool, task.id).await?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let done_by_name = match &item.done_by {
            Some(fiscal_code) => volunteer_repo::get_volunteer_by_fiscal_code(pool, fiscal_code)
                .await?
                .map(|v| v.first_name),
            None => None,
        };
        lines.push(ChecklistLine { item, done_by_name });
    }

    Ok(render_checklist(&task.name, &lines))
}
