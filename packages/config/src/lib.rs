// ABOUTME: Environment variable names shared by the CloudTrain server crates
// ABOUTME: Keeps configuration keys in one place so binaries and tests agree on them

pub mod constants;

pub use constants::*;
