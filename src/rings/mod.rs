pub mod poly;

pub use poly::RingPoly;
pub(crate) use poly::{bit_len, centered_split, round_div_nearest};
