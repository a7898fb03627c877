pub mod user;

pub use user::{RewardLog, Score, User};
