//! Lazy streams over paginated tracker listings.

use crate::assignment::ports::Page;
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::future::Future;

/// Streams the items of a paginated listing, fetching each page only when
/// the previous one has been consumed.
///
/// `fetch` receives the token of the page to load, starting with `start`.
/// The stream ends after a page without a `next` token and stops at the
/// first error.
pub fn paginate<'a, T, E, C, F, Fut>(start: C, fetch: F) -> BoxStream<'a, Result<T, E>>
where
    T: Send + 'a,
    E: Send + 'a,
    C: Send + 'a,
    F: FnMut(C) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Page<T, C>, E>> + Send + 'a,
{
    stream::try_unfold(
        (Some(start), fetch),
        |(token, mut fetch)| async move {
            let Some(current) = token else {
                return Ok(None);
            };
            let page = fetch(current).await?;
            let items = stream::iter(page.items.into_iter().map(Ok::<T, E>));
            Ok(Some((items, (page.next, fetch))))
        },
    )
    .try_flatten()
    .boxed()
}

/// Returns the next page number when `len` items filled a page of
/// `page_size`.
#[must_use]
pub const fn next_page_number(current: u32, len: usize, page_size: usize) -> Option<u32> {
    if len >= page_size && page_size > 0 {
        current.checked_add(1)
    } else {
        None
    }
}
