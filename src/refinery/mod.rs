// * The Refinery: HTML -> SEO signals and visible text

pub mod signals;
pub mod text;

// * Re-exports for convenient access
pub use signals::{ImageInfo, LinkSummary, PageSignals, SignalExtractor};
pub use text::{tokenize, VisibleText};
