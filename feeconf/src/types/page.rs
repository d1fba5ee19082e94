use serde::{Deserialize, Serialize};

use super::enums::{ConfigStatus, Scope};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_docs: usize,
    pub limit: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> PageResult<T> {
    /// Cut page `page` (1-based) of size `limit` out of an already sorted list.
    pub fn paginate(all: Vec<T>, page: usize, limit: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_docs = all.len();
        let total_pages = total_docs.div_ceil(limit);
        let items: Vec<T> = all
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            items,
            page,
            total_pages,
            total_docs,
            limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    EffectiveFrom,
    Version,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filter, sort and pagination for listing configurations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub channel_bundle_id: Option<String>,
    #[serde(default)]
    pub status: Option<ConfigStatus>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            scope: None,
            tenant_id: None,
            channel_bundle_id: None,
            status: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page: default_page(),
            limit: default_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_middle_page() {
        let page = PageResult::paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.total_docs, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next_page);
        assert!(page.has_prev_page);
    }

    #[test]
    fn test_paginate_last_partial_page() {
        let page = PageResult::paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_paginate_empty() {
        let page = PageResult::paginate(Vec::<u32>::new(), 1, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(!page.has_prev_page);
    }

    #[test]
    fn test_paginate_far_past_the_end() {
        let page = PageResult::paginate((1..=25).collect::<Vec<_>>(), usize::MAX, 10);
        assert!(page.items.is_empty());
        assert_eq!(page.page, usize::MAX);
        assert!(!page.has_next_page);
        assert!(page.has_prev_page);

        let page = PageResult::paginate((1..=25).collect::<Vec<_>>(), 3, usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_list_query_defaults_from_empty_json() {
        let q: ListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q, ListQuery::default());
        assert_eq!(q.limit, 10);
        assert_eq!(q.sort_by, SortField::EffectiveFrom);
        assert_eq!(q.sort_order, SortOrder::Desc);
    }
}
