pub mod color;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod paint;
pub mod text;

pub use error::{Error, Result};
pub use geometry::{EdgeOffsets, Point, Rect, Size};

// The crate's front door: fonts in, laid-out pages out.
pub use color::Color;
pub use font::{FontCache, FontFace, FontLibrary};
pub use layout::{LayoutStream, PageSetup, PrintContext, ShapeContext};
pub use paint::{RasterSurface, SegmentPainter};
pub use text::{Segment, ShapingEngine};
