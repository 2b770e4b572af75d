//! Value types shared by queries and their results: ordering, paging and
//! pages.

mod page;
mod sort;

pub use page::{Page, PageRequest, Pageable, Window};
pub use sort::{Direction, Order, Sort};
