pub mod health;
pub mod manage;
pub mod serve;
pub mod upload;
