pub mod compression;
pub mod config;
pub mod error;
pub mod models;

// 重新导出常用模块和函数，方便直接使用
pub use compression::{to_compressed, from_compressed, to_binary, from_binary, validate_compressed_data};
pub use config::CatalogConfig;
pub use error::{CatalogError, Result};
pub use models::{Articulo, CatalogSnapshot, CatalogStats, ItemId, Revista};
