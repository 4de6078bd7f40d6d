#![allow(ambiguous_glob_reexports)]

pub mod initialize;
pub mod play;
pub mod check_upkeep;
pub mod perform_upkeep;
pub mod fulfill_random_words;
pub mod withdraw_fees;
pub mod ticket_price;

pub use initialize::*;
pub use play::*;
pub use check_upkeep::*;
pub use perform_upkeep::*;
pub use fulfill_random_words::*;
pub use withdraw_fees::*;
pub use ticket_price::*;
