use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Page size and position of one list page.
///
/// `current_page` is 1-based and never below 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    page_size: usize,
    current_page: usize,
}

impl PageState {
    pub fn new(page_size: usize) -> DomainResult<Self> {
        if page_size == 0 {
            return Err(DomainError::InvariantViolation(
                "Page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            page_size,
            current_page: 1,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn set_page_size(&mut self, page_size: usize) -> DomainResult<()> {
        *self = Self::new(page_size)?;
        Ok(())
    }

    /// Move to a page; anything below 1 lands on 1.
    pub fn go_to(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// `max(1, ceil(count / page_size))`
    pub fn total_pages_for(&self, count: usize) -> usize {
        count.div_ceil(self.page_size).max(1)
    }

    /// Pull `current_page` back inside `[1, total_pages]`.
    /// Returns whether it moved.
    pub fn clamp_to(&mut self, total_pages: usize) -> bool {
        let clamped = self.current_page.clamp(1, total_pages.max(1));
        let moved = clamped != self.current_page;
        self.current_page = clamped;
        moved
    }

    /// Zero-based offset of the first item on the current page
    pub fn offset(&self) -> usize {
        (self.current_page - 1) * self.page_size
    }
}
