pub mod bundle;
pub mod pool;
pub mod token;

pub use bundle::{Bundle, BUNDLE_ID};
pub use pool::{Pool, PoolSide};
pub use token::Token;
