mod delimiter;


pub use delimiter::{find_splits, find_splits_with, slice_at, DEFAULT_DELIMITERS};
