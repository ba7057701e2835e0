//! Finding (or creating) the calendar a schedule syncs into.

use tracing::info;

use crate::error::FixtureResult;
use crate::store::{CalendarStore, Container};

/// Look up a container by exact display name without creating anything.
pub async fn find_container<S: CalendarStore>(
    store: &S,
    name: &str,
) -> FixtureResult<Option<Container>> {
    let containers = store.list_containers().await?;
    Ok(containers.into_iter().find(|c| c.display_name == name))
}

/// Return the id of the container named `name`, creating it if needed.
pub async fn resolve_container<S: CalendarStore>(
    store: &S,
    name: &str,
    source_url: &str,
) -> FixtureResult<String> {
    if let Some(container) = find_container(store, name).await? {
        return Ok(container.id);
    }

    let description = format!("Fixtures for {name}, synced by fixturecal from {source_url}");
    let id = store.create_container(name, &description).await?;
    info!(calendar = name, id = %id, "created calendar");
    Ok(id)
}
