pub mod cursor;
pub mod display;
pub mod page;

pub use cursor::Cursor;
pub use page::{Keyed, Page};
