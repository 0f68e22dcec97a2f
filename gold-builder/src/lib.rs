// Copyright (c) James Kassemi, SC, US. All rights reserved.

//! Per-symbol daily features (`gold.futures_day`) derived from one day of silver data.

mod builder;
mod error;
mod features;
mod silver;

pub use builder::{GoldBuild, GoldBuilder};
pub use error::GoldError;
pub use features::compute_gold_row;
pub use silver::{MwplLookup, SilverDay};
