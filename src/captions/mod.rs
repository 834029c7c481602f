//! Track selection and caption content download.

pub mod fetcher;
pub mod selector;

pub use fetcher::{CaptionFetcher, FetchedCaptions};
pub use selector::pick_track;
