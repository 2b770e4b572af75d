//! Paging requests and result pages.

use serde::Serialize;

use crate::domain::sort::Sort;

/// A zero-based page request with its own optional sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    #[serde(skip)]
    pub sort: Sort,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }
}

/// Either a page request or "everything at once".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Pageable {
    #[default]
    Unpaged,
    Paged(PageRequest),
}

/// The rows to skip and return for a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

impl Pageable {
    /// Requests page `page` (zero-based) of `size` elements. A size of zero
    /// is raised to one.
    pub fn of(page: u64, size: u64) -> Self {
        Pageable::Paged(PageRequest {
            page,
            size: size.max(1),
            sort: Sort::unsorted(),
        })
    }

    pub fn unpaged() -> Self {
        Pageable::Unpaged
    }

    /// Attaches a sort to a paged request. Unpaged requests carry no sort.
    pub fn with_sort(self, sort: Sort) -> Self {
        match self {
            Pageable::Paged(request) => Pageable::Paged(PageRequest { sort, ..request }),
            Pageable::Unpaged => Pageable::Unpaged,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Pageable::Paged(_))
    }

    pub fn sort(&self) -> Sort {
        match self {
            Pageable::Paged(request) => request.sort.clone(),
            Pageable::Unpaged => Sort::unsorted(),
        }
    }

    pub fn window(&self) -> Option<Window> {
        match self {
            Pageable::Paged(request) => Some(Window {
                skip: request.offset(),
                limit: request.size,
            }),
            Pageable::Unpaged => None,
        }
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u64,
    pub size: u64,
    pub total: u64,
}

impl<T> Page<T> {
    /// Builds a page from its content and a known total.
    ///
    /// A total smaller than what a non-empty page proves to exist is
    /// corrected upwards, so a racing delete between the two round-trips
    /// never yields a page claiming fewer elements than it holds.
    pub fn new(content: Vec<T>, pageable: &Pageable, total: u64) -> Self {
        match pageable {
            Pageable::Paged(request) => {
                let seen = request.offset().saturating_add(content.len() as u64);
                // An empty page proves nothing; past the end the count stands.
                let total = if content.is_empty() {
                    total
                } else if request.offset().saturating_add(request.size) > total {
                    seen
                } else {
                    total.max(seen)
                };
                Self {
                    number: request.page,
                    size: request.size,
                    total,
                    content,
                }
            }
            Pageable::Unpaged => Self {
                number: 0,
                size: content.len() as u64,
                total: total.max(content.len() as u64),
                content,
            },
        }
    }

    /// Builds a page, calling `total` only when the count cannot be derived
    /// from the content alone: an unpaged request, a short first page, or a
    /// short non-empty last page.
    pub fn assemble<F, E>(content: Vec<T>, pageable: &Pageable, total: F) -> Result<Self, E>
    where
        F: FnOnce() -> Result<u64, E>,
    {
        let len = content.len() as u64;
        let known = match pageable {
            Pageable::Unpaged => Some(len),
            Pageable::Paged(request) if request.offset() == 0 && request.size > len => Some(len),
            Pageable::Paged(request) if len != 0 && request.size > len => {
                Some(request.offset().saturating_add(len))
            }
            Pageable::Paged(_) => None,
        };
        let total = match known {
            Some(total) => total,
            None => total()?,
        };
        Ok(Self::new(content, pageable, total))
    }

    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            1
        } else {
            self.total.div_ceil(self.size)
        }
    }

    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages()
    }
}
