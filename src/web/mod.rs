//! Web module - page assembly and HTTP serving

mod page;
mod server;

pub use page::{DashboardPage, PageError, PAGE_SOURCE, PAGE_TITLE};
pub use server::{router, serve};
