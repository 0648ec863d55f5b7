//! Wire types shared by every route: the error envelope and list pagination.

mod error;
mod pagination;

pub use error::*;
pub use pagination::*;
