//! Click primitive

use page_adapter::PageAdapter;
use tracing::debug;
use webminer_core_types::ElementHandle;

use crate::{errors::ActionError, primitives::check_cancelled, types::ExecCtx};

/// Click every element. Returns how many were clicked.
pub async fn execute_click(
    page: &dyn PageAdapter,
    ctx: &ExecCtx,
    elements: &[ElementHandle],
) -> Result<usize, ActionError> {
    for (done, handle) in elements.iter().enumerate() {
        check_cancelled(ctx, done)?;
        debug!(action_id = %ctx.action_id, %handle, "Clicking element");
        page.click(*handle).await?;
    }
    Ok(elements.len())
}
