//! Search orchestration: drives the host engine and turns what it reports into
//! typed hits with context windows.

pub mod context;
pub mod listing;
pub mod symbols;
pub mod text;

pub use context::{ContextMargins, ContextWindow};
pub use listing::{parse_listing, ListingLine};
pub use symbols::{find_symbols, SymbolHit};
pub use text::{find_text, TextHit, TextQuery, TextSearchSettings};
