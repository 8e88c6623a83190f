pub mod campaign;
pub mod numeric;

pub use campaign::*;
pub use numeric::*;
