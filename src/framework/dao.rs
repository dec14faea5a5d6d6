//! DAO contract
//!
//! A DAO is the adapter between one AWS resource type and the generic
//! framework: list (optionally paginated), get-by-id, delete. DAOs are
//! stateless apart from a held client handle; every call is an
//! independent round trip with no caching and no retries.

use super::error::{Error, Result};
use super::resource::Resource;
use async_trait::async_trait;

/// Operations a DAO may support
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    List,
    ListPage,
    Get,
    Delete,
}

/// One page of a paginated list
pub struct Page {
    pub resources: Vec<Box<dyn Resource>>,
    /// Opaque continuation token; `None` (or empty) means no further pages.
    pub next_token: Option<String>,
}

/// Data access for one resource type.
///
/// Callers must consult [`Dao::supports`] before invoking an optional
/// operation; the defaults fail with [`Error::Unsupported`].
#[async_trait]
pub trait Dao: Send + Sync {
    fn supports(&self, op: Op) -> bool {
        matches!(op, Op::List)
    }

    async fn list(&self) -> Result<Vec<Box<dyn Resource>>>;

    async fn list_page(&self, _page_size: usize, _token: Option<&str>) -> Result<Page> {
        Err(Error::Unsupported("pagination".into()))
    }

    async fn get(&self, _id: &str) -> Result<Box<dyn Resource>> {
        Err(Error::Unsupported("get".into()))
    }

    /// Idempotent where the backing API allows it: deleting an already
    /// absent id is success, not an error.
    async fn delete(&self, _id: &str) -> Result<()> {
        Err(Error::Unsupported("delete".into()))
    }
}

/// Drain every page of a paginated DAO, or fall back to `list` when the
/// DAO does not paginate. Dropping the returned future mid-loop stops
/// the remaining pages from being fetched.
pub async fn list_all(dao: &dyn Dao, page_size: usize) -> Result<Vec<Box<dyn Resource>>> {
    if !dao.supports(Op::ListPage) {
        return dao.list().await;
    }

    let mut all = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = dao.list_page(page_size, token.as_deref()).await?;
        all.extend(page.resources);

        match page.next_token {
            Some(t) if !t.is_empty() => token = Some(t),
            _ => break,
        }
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::resource::JsonResource;
    use serde_json::json;

    struct PagedDao;

    #[async_trait]
    impl Dao for PagedDao {
        fn supports(&self, op: Op) -> bool {
            matches!(op, Op::List | Op::ListPage)
        }

        async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
            list_all(self, 2).await
        }

        async fn list_page(&self, _page_size: usize, token: Option<&str>) -> Result<Page> {
            let (ids, next): (&[&str], Option<String>) = match token {
                None => (&["a", "b"], Some("page-2".into())),
                Some("page-2") => (&["c"], None),
                Some(other) => {
                    return Err(Error::NotFound {
                        what: format!("page {other}"),
                    })
                }
            };

            let resources = ids
                .iter()
                .map(|id| {
                    Box::new(JsonResource::new(json!({"id": id}), "id", "", ""))
                        as Box<dyn Resource>
                })
                .collect();

            Ok(Page {
                resources,
                next_token: next,
            })
        }
    }

    #[tokio::test]
    async fn list_all_drains_every_page() {
        let dao = PagedDao;
        let resources = list_all(&dao, 2).await.unwrap();
        let ids: Vec<&str> = resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn defaults_are_unsupported() {
        struct ListOnly;

        #[async_trait]
        impl Dao for ListOnly {
            async fn list(&self) -> Result<Vec<Box<dyn Resource>>> {
                Ok(Vec::new())
            }
        }

        let dao = ListOnly;
        assert!(dao.supports(Op::List));
        assert!(!dao.supports(Op::Delete));
        assert!(matches!(
            dao.get("x").await,
            Err(Error::Unsupported(op)) if op == "get"
        ));
        assert!(matches!(
            dao.delete("x").await,
            Err(Error::Unsupported(op)) if op == "delete"
        ));
    }
}
