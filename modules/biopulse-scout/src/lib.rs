pub mod collector;
pub mod dates;
pub mod domains;
pub mod feeds;
pub mod fetch;
pub mod planner;
pub mod search;
pub mod taxonomy;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod verifier;
