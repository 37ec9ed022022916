pub mod analysis;
pub mod catalog;
pub mod user;

pub use analysis::*;
pub use catalog::*;
pub use user::*;
