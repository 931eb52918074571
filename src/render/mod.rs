mod color;
mod error;
mod page;
mod writer;

pub use color::{ColorScale, Rgb};
pub use error::RenderError;
pub use page::{colorize, render_page, PageContext, PassesPage};
pub use writer::write_atomic;
