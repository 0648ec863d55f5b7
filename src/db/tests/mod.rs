//! Shared database repository test infrastructure
//!
//! Each repository has a test module (e.g., `experiences.rs`) containing:
//! - Shared test functions that take a `&RepoTestContext`
//! - A `sqlite_test!` macro instantiating them over a fresh in-memory database
//!
//! ```bash
//! cargo test db::tests
//! ```

mod accounts;
mod analytics;
pub mod harness;
mod notifications;

/// Instantiate shared repository tests over a fresh SQLite database.
macro_rules! sqlite_test {
    ($($name:ident),* $(,)?) => {
        mod sqlite_tests {
            $(
                #[tokio::test]
                async fn $name() {
                    let ctx = $crate::db::tests::harness::RepoTestContext::new().await;
                    super::$name(&ctx).await;
                }
            )*
        }
    };
}

pub(crate) use sqlite_test;
