//! Element discovery over ordered fallback selectors
//!
//! Target pages have unknown markup, so callers pass candidates from most
//! specific (`.output`) to most generic (`textarea`). The first selector with
//! at least one match wins.

use tracing::debug;

use crate::driver::{Element, PageDriver};
use crate::error::E2eResult;

/// First element matched by any of `selectors`, tried in order.
///
/// `Ok(None)` means nothing matched; driver faults propagate as errors.
pub async fn locate<D, S>(driver: &D, selectors: &[S]) -> E2eResult<Option<Element>>
where
    D: PageDriver + ?Sized,
    S: AsRef<str>,
{
    locate_within(driver, None, selectors).await
}

/// Like [`locate`], scoped to descendants of `scope` when given
pub async fn locate_within<D, S>(
    driver: &D,
    scope: Option<&Element>,
    selectors: &[S],
) -> E2eResult<Option<Element>>
where
    D: PageDriver + ?Sized,
    S: AsRef<str>,
{
    for selector in selectors {
        let candidate = match scope {
            Some(parent) => parent.child(selector.as_ref()),
            None => Element::new(selector.as_ref()),
        };

        let matches = driver.count(candidate.selector()).await?;
        debug!("Selector {} matched {} element(s)", candidate, matches);
        if matches > 0 {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}
