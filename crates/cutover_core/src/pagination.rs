//! Fixed-size paging over the TPS candidate pool.

pub const TPS_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    page: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(TPS_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Never less than one, so an empty pool still reads "page 1 of 1".
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.page_size).max(1)
    }

    /// The stored page clamped to the pool as it is now.
    pub fn current(&self, len: usize) -> usize {
        self.page.clamp(1, self.total_pages(len))
    }

    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current(items.len()) - 1) * self.page_size;
        let end = (start + self.page_size).min(items.len());
        &items[start..end]
    }

    pub fn next(&mut self, len: usize) -> usize {
        self.page = (self.current(len) + 1).min(self.total_pages(len));
        self.page
    }

    pub fn previous(&mut self, len: usize) -> usize {
        self.page = self.current(len).saturating_sub(1).max(1);
        self.page
    }

    pub fn go_to(&mut self, page: usize, len: usize) -> usize {
        self.page = page.clamp(1, self.total_pages(len));
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}
