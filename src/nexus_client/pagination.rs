// Continuation-token pagination. Any page failure aborts the whole collection.

use std::future::Future;

use crate::models::Page;

/// Items from every page in page order, plus how many pages were fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected<T> {
    pub items: Vec<T>,
    pub pages: usize,
}

/// Calls `fetch_page` with `None`, then with each returned token, until a page comes
/// back without one.
pub async fn collect_pages<T, E, F, Fut>(mut fetch_page: F) -> Result<Collected<T>, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    let mut items = Vec::new();
    let mut pages = 0usize;
    let mut cursor: Option<String> = None;

    loop {
        let page = fetch_page(cursor.take()).await?;
        pages += 1;
        tracing::debug!(
            page = pages,
            items = page.items.len(),
            has_next = page.continuation_token.is_some(),
            "fetched page"
        );
        items.extend(page.items);
        match page.continuation_token {
            Some(token) if !token.is_empty() => cursor = Some(token),
            _ => break,
        }
    }

    Ok(Collected { items, pages })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn page(items: &[u32], token: Option<&str>) -> Page<u32> {
        Page {
            items: items.to_vec(),
            continuation_token: token.map(String::from),
        }
    }

    #[tokio::test]
    async fn follows_tokens_in_order_and_stops_on_last_page() {
        let mut pages = VecDeque::from(vec![
            page(&[1, 2], Some("abc")),
            page(&[3], Some("xyz")),
            page(&[4, 5], None),
        ]);
        let mut seen_cursors = Vec::new();

        let collected: Collected<u32> = collect_pages(|cursor| {
            seen_cursors.push(cursor);
            let next = pages.pop_front();
            async move { next.ok_or("requested past the last page") }
        })
        .await
        .unwrap();

        assert_eq!(collected.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(collected.pages, 3);
        assert_eq!(
            seen_cursors,
            vec![None, Some("abc".to_string()), Some("xyz".to_string())]
        );
    }

    #[tokio::test]
    async fn empty_token_terminates() {
        let collected: Collected<u32> =
            collect_pages(|_| async { Ok::<_, ()>(page(&[7], Some(""))) })
                .await
                .unwrap();
        assert_eq!(collected.items, vec![7]);
        assert_eq!(collected.pages, 1);
    }

    #[tokio::test]
    async fn failure_mid_way_discards_partial_result() {
        let mut calls = 0;
        let result: Result<Collected<u32>, &str> = collect_pages(|_| {
            calls += 1;
            let n = calls;
            async move {
                if n == 1 {
                    Ok(page(&[1], Some("next")))
                } else {
                    Err("boom")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls, 2);
    }
}
