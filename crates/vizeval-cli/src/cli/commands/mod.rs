pub mod cache;
pub mod dispatch;
pub(crate) mod run;
pub(crate) mod score;

pub use dispatch::dispatch;
