pub mod cursor;
pub mod fonts;
pub mod page;
pub mod table;
pub mod text;

pub use cursor::{LayoutError, PageManager};
pub use fonts::{FontFace, FontSet};
pub use page::{Color, DrawOp, FontStyle, Geometry, Page, PageKind, Section};
pub use table::{draw_table, Cell, Table, TableTheme};
pub use text::TextStyle;
