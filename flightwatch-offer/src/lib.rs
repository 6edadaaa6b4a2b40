pub mod dates;
pub mod normalizer;
pub mod orchestrator;
pub mod pacing;
pub mod raw;
pub mod retry;
pub mod rules;

pub use dates::expand;
pub use normalizer::normalize;
pub use orchestrator::SearchOrchestrator;
pub use pacing::{CallPacer, TokenBucketPacer, Unpaced};
pub use retry::RetryPolicy;
pub use rules::admits;
