pub mod market;

pub use market::normalize;
