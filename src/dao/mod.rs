/// Entities persisted by the scoped stores.
pub mod models;
/// Comment and leaderboard record stores with interchangeable backends.
pub mod scoped_store;
/// Storage abstraction layer shared by every backend.
pub mod storage;
