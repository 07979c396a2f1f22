pub mod memory;
pub mod models;

pub use memory::{MemoryStore, Snapshot};

use models::{Bundle, Pool, Token};

/// Entity persistence used by the pricing core.
///
/// Reads return `Ok(None)` for entities that have not been indexed yet; the
/// core treats that as a zero-valued input. An `Err` is a storage failure and
/// fails the event being processed.
pub trait EntityStore {
    fn get_token(&self, address: &str) -> anyhow::Result<Option<Token>>;
    fn get_pool(&self, address: &str) -> anyhow::Result<Option<Pool>>;
    fn get_bundle(&self) -> anyhow::Result<Option<Bundle>>;

    fn set_token(&mut self, token: &Token) -> anyhow::Result<()>;
    fn set_pool(&mut self, pool: &Pool) -> anyhow::Result<()>;
    fn set_bundle(&mut self, bundle: &Bundle) -> anyhow::Result<()>;
}
