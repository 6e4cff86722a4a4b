//! Fresh counter web app
//!
//! Serves the counter page, its island script and the greeting API.

pub mod counter;
pub mod greeting;
pub mod page;
pub mod server;
pub mod static_files;

pub use counter::{Counter, INITIAL_COUNT};
pub use greeting::greet;
pub use server::{router, serve};
