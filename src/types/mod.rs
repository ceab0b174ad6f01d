pub mod series;
pub mod record;

pub use series::*;
pub use record::*;
