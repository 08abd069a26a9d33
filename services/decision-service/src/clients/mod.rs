pub mod execute;
pub mod explain;
pub mod learner;

pub use execute::ExecuteClient;
pub use explain::ExplainClient;
pub use learner::LearnerClient;
