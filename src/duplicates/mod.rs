pub mod finder;
pub mod hasher;

pub use finder::{find, find_with_progress, DuplicateGroup, DuplicateReport};
