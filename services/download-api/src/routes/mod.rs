pub mod download;

pub use download::routes;
