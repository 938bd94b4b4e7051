pub mod files;
pub mod record;

pub use files::*;
pub use record::*;
