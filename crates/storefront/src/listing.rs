//! Product list processing: category filter, sort and page windows.
//!
//! Pure functions over an already-merged catalog. Pages are 1-based.

use std::fmt;
use std::str::FromStr;

use crate::models::ProductRecord;

/// Listing sort order, by product id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Descending id.
    #[default]
    Newest,
    /// Ascending id.
    Oldest,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "latest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Newest => write!(f, "newest"),
            Self::Oldest => write!(f, "oldest"),
        }
    }
}

/// Filter, sort and window parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Keep only this category when set.
    pub category: Option<String>,
    pub sort: SortOrder,
    /// 1-based page number; 0 is read as 1.
    pub page: usize,
    pub page_size: usize,
}

impl ListQuery {
    /// First page of everything, newest first.
    #[must_use]
    pub const fn new(page_size: usize) -> Self {
        Self {
            category: None,
            sort: SortOrder::Newest,
            page: 1,
            page_size,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }
}

/// One page window of a projected list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    /// Matching items before pagination.
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> ListPage<T> {
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        total_pages(self.total_count, self.page_size)
    }

    /// Whether a later page has items.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Filter, sort and slice `items` according to `query`.
#[must_use]
pub fn project(items: &[ProductRecord], query: &ListQuery) -> ListPage<ProductRecord> {
    let mut matching: Vec<ProductRecord> = items
        .iter()
        .filter(|item| {
            query
                .category
                .as_deref()
                .is_none_or(|category| item.category == category)
        })
        .cloned()
        .collect();

    match query.sort {
        SortOrder::Newest => matching.sort_by(|a, b| b.id.cmp(&a.id)),
        SortOrder::Oldest => matching.sort_by(|a, b| a.id.cmp(&b.id)),
    }

    paginate(matching, query.page, query.page_size)
}

/// Take the `page`-th window of `page_size` items.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> ListPage<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_count = items.len();
    let start = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(start).take(page_size).collect();
    ListPage {
        items,
        total_count,
        page,
        page_size,
    }
}

/// `ceil(total_count / page_size)`, treating a zero page size as 1.
#[must_use]
pub const fn total_pages(total_count: usize, page_size: usize) -> usize {
    let page_size = if page_size == 0 { 1 } else { page_size };
    total_count.div_ceil(page_size)
}

/// Accumulating ("infinite scroll") view over successive pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFeed<T> {
    items: Vec<T>,
    loaded_pages: usize,
    total_count: usize,
    page_size: usize,
}

impl<T> Default for ListingFeed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded_pages: 0,
            total_count: 0,
            page_size: 1,
        }
    }
}

impl<T> ListingFeed<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a page into the feed. Page 1 replaces everything; later pages
    /// append.
    pub fn apply(&mut self, page: ListPage<T>) {
        if page.page <= 1 {
            self.items = page.items;
        } else {
            self.items.extend(page.items);
        }
        self.loaded_pages = page.page.max(1);
        self.total_count = page.total_count;
        self.page_size = page.page_size;
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    /// Page to request next, or `None` once everything is loaded.
    #[must_use]
    pub const fn next_page(&self) -> Option<usize> {
        if self.loaded_pages == 0 {
            Some(1)
        } else if self.loaded_pages < total_pages(self.total_count, self.page_size) {
            Some(self.loaded_pages + 1)
        } else {
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use marketstall_core::{Price, ProductId, UserId};

    use super::*;
    use crate::models::{Origin, SellerRef};

    fn item(id: i64, category: &str) -> ProductRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        ProductRecord {
            id: ProductId::new(id),
            name: format!("item {id}"),
            image: String::new(),
            price: Price::won(1_000),
            description: String::new(),
            category: category.to_string(),
            seller: SellerRef {
                id: UserId::new("s"),
                nickname: "shop".to_string(),
            },
            created_on: day,
            updated_on: day,
            origin: Origin::Seed,
        }
    }

    fn ids(page: &ListPage<ProductRecord>) -> Vec<i64> {
        page.items.iter().map(|i| i.id.as_i64()).collect()
    }

    #[test]
    fn test_filter_by_category() {
        let items = vec![item(1, "A"), item(2, "B")];
        let page = project(&items, &ListQuery::new(12).category("A"));
        assert_eq!(ids(&page), vec![1]);
        assert_eq!(page.total_count, 1);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_sort_orders() {
        let items = vec![item(2, "A"), item(3, "A"), item(1, "A")];
        let newest = project(&items, &ListQuery::new(12));
        let oldest = project(&items, &ListQuery::new(12).sort(SortOrder::Oldest));
        assert_eq!(ids(&newest), vec![3, 2, 1]);
        assert_eq!(ids(&oldest), vec![1, 2, 3]);
        assert_eq!(newest.total_count, oldest.total_count);
    }

    #[test]
    fn test_page_windows() {
        let items: Vec<ProductRecord> = (1..=25).map(|id| item(id, "A")).collect();
        let query = ListQuery::new(12).sort(SortOrder::Oldest);

        let third = project(&items, &query.clone().page(3));
        assert_eq!(ids(&third), vec![25]);
        assert_eq!(third.total_pages(), 3);
        assert!(!third.has_more());

        let beyond = project(&items, &query.clone().page(4));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total_count, 25);

        let zero = project(&items, &query.page(0));
        assert_eq!(zero.page, 1);
        assert_eq!(zero.items.len(), 12);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 12), 0);
        assert_eq!(total_pages(12, 12), 1);
        assert_eq!(total_pages(13, 12), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn test_feed_accumulates_and_resets() {
        let items: Vec<ProductRecord> = (1..=5).map(|id| item(id, "A")).collect();
        let query = ListQuery::new(2).sort(SortOrder::Oldest);
        let mut feed = ListingFeed::new();
        assert_eq!(feed.next_page(), Some(1));

        feed.apply(project(&items, &query.clone().page(1)));
        feed.apply(project(&items, &query.clone().page(2)));
        assert_eq!(feed.items().len(), 4);
        assert_eq!(feed.next_page(), Some(3));

        feed.apply(project(&items, &query.clone().page(3)));
        assert_eq!(feed.items().len(), 5);
        assert_eq!(feed.next_page(), None);

        feed.apply(project(&items, &query.page(1)));
        assert_eq!(feed.items().len(), 2);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("Oldest".parse::<SortOrder>().unwrap(), SortOrder::Oldest);
        assert_eq!("latest".parse::<SortOrder>().unwrap(), SortOrder::Newest);
        assert!("random".parse::<SortOrder>().is_err());
    }
}
