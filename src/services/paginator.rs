// src/services/paginator.rs
//
// Page slicing over an already filtered and sorted list.

use serde::Serialize;

use crate::domain::{PageState, Resource};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSlice {
    pub items: Vec<Resource>,
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based inclusive `[start, end]`, `(0, 0)` for an empty list
    pub display_range: (usize, usize),
}

pub struct Paginator;

impl Paginator {
    /// Slice `ordered` for `page`. A page past the end yields no items; the
    /// controller clamps before it gets here.
    pub fn paginate(ordered: &[Resource], page: &PageState) -> PageSlice {
        let total_items = ordered.len();
        let start = page.offset().min(total_items);
        let end = (start + page.page_size()).min(total_items);

        PageSlice {
            items: ordered[start..end].to_vec(),
            total_items,
            total_pages: page.total_pages_for(total_items),
            display_range: Self::display_range(page, total_items),
        }
    }

    /// Page metadata for a list the server already paginated.
    ///
    /// `items` is the server's page as returned; it is never re-sliced.
    pub fn server_page(items: Vec<Resource>, total_items: usize, page: &PageState) -> PageSlice {
        let total_items = total_items.max(items.len());
        let shown = items.len();
        let display_range = if shown == 0 {
            (0, 0)
        } else {
            (page.offset() + 1, page.offset() + shown)
        };

        PageSlice {
            items,
            total_items,
            total_pages: page.total_pages_for(total_items),
            display_range,
        }
    }

    fn display_range(page: &PageState, total_items: usize) -> (usize, usize) {
        if total_items == 0 {
            return (0, 0);
        }
        let start = page.offset() + 1;
        if start > total_items {
            return (0, 0);
        }
        (start, (page.offset() + page.page_size()).min(total_items))
    }
}
