//! Open link primitive

use page_adapter::PageAdapter;
use tracing::{debug, info};
use webminer_core_types::{ElementHandle, OpenLinksRequest};

use crate::{
    dispatch::TabDispatcher, errors::ActionError, primitives::check_cancelled,
    types::{ExecCtx, TabSettings},
};

/// Collect the hrefs of `elements` in order, skipping elements without one.
pub async fn collect_links(
    page: &dyn PageAdapter,
    ctx: &ExecCtx,
    elements: &[ElementHandle],
) -> Result<Vec<String>, ActionError> {
    let mut links = Vec::with_capacity(elements.len());
    for (done, handle) in elements.iter().enumerate() {
        check_cancelled(ctx, done)?;
        match page.link_href(*handle).await? {
            Some(href) => links.push(href),
            None => debug!(%handle, "Skipping element without href"),
        }
    }
    Ok(links)
}

/// Hand the links of `elements` to the tab host. Returns the URLs sent.
///
/// Does not wait for tabs to open.
pub async fn execute_open_link(
    page: &dyn PageAdapter,
    ctx: &ExecCtx,
    elements: &[ElementHandle],
    script_name: Option<&str>,
    tabs: TabSettings,
    dispatcher: &dyn TabDispatcher,
) -> Result<Vec<String>, ActionError> {
    let links = collect_links(page, ctx, elements).await?;
    if links.is_empty() {
        return Err(ActionError::NoValidLinks(elements.len()));
    }

    info!(
        action_id = %ctx.action_id,
        links = links.len(),
        script = ?script_name,
        "Dispatching open-links request"
    );
    dispatcher.dispatch(OpenLinksRequest {
        link_urls: links.clone(),
        max_tabs: tabs.max_tabs,
        close_on_done: tabs.close_on_done,
        script_name: script_name.map(str::to_string),
    })?;
    Ok(links)
}
