//! Input text primitive

use page_adapter::{DomEvent, PageAdapter};
use tracing::debug;
use webminer_core_types::ElementHandle;

use crate::{errors::ActionError, primitives::check_cancelled, types::ExecCtx};

/// Set `text` as the value of every element.
///
/// Assigning a value fires no listeners, so each element then receives a
/// bubbling `input` event followed by a bubbling `change` event.
pub async fn execute_input_text(
    page: &dyn PageAdapter,
    ctx: &ExecCtx,
    elements: &[ElementHandle],
    text: &str,
) -> Result<usize, ActionError> {
    for (done, handle) in elements.iter().enumerate() {
        check_cancelled(ctx, done)?;
        debug!(
            action_id = %ctx.action_id,
            %handle,
            text_length = text.len(),
            "Setting element value"
        );
        page.set_value(*handle, text).await?;
        page.dispatch_event(*handle, DomEvent::Input).await?;
        page.dispatch_event(*handle, DomEvent::Change).await?;
    }
    Ok(elements.len())
}
