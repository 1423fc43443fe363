pub mod checkout;
pub mod placement;


pub use checkout::*;
pub use placement::*;
