use serde::{Serialize, Serializer};

/// Rows per board page
pub const PAGE_SIZE: usize = 10;

/// Page lists longer than this collapse into ellipsis form
const MAX_PAGE_LINKS: usize = 7;

/// One slot in a page list: a page number or a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEntry {
    Page(usize),
    Gap,
}

impl Serialize for PageEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageEntry::Page(n) => serializer.serialize_u64(*n as u64),
            PageEntry::Gap => serializer.serialize_str("..."),
        }
    }
}

/// 1-based pagination over a known item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total_items: usize,
    per_page: usize,
    current: usize,
}

impl Paginator {
    /// `current` is clamped into `1..=total_pages`.
    pub fn new(total_items: usize, per_page: usize, current: usize) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total_items.div_ceil(per_page);
        Self {
            total_items,
            per_page,
            current: current.clamp(1, total_pages.max(1)),
        }
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.per_page)
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = ((self.current - 1) * self.per_page).min(items.len());
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }

    /// Page links around the current page, e.g. `1 2 3 4 5 … 12`.
    pub fn page_list(&self) -> Vec<PageEntry> {
        use PageEntry::{Gap, Page};

        let total = self.total_pages();
        let p = self.current;

        if total <= MAX_PAGE_LINKS {
            return (1..=total).map(Page).collect();
        }

        if p <= 4 {
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Gap, Page(total)]
        } else if p >= total - 3 {
            vec![
                Page(1),
                Gap,
                Page(total - 4),
                Page(total - 3),
                Page(total - 2),
                Page(total - 1),
                Page(total),
            ]
        } else {
            vec![Page(1), Gap, Page(p - 1), Page(p), Page(p + 1), Gap, Page(total)]
        }
    }
}
