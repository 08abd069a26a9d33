pub mod decision;
pub mod learner;

pub use decision::DecisionTrigger;
pub use learner::LearnerForwarder;
