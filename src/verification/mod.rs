pub mod answers;
pub mod approval;
pub mod authorization;
pub mod catalog;
pub mod outcome;
pub mod prompt;
pub mod record;
pub mod selector;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub mod testing;

pub use approval::{
    ApprovalAuthority, ApprovalDecision, AutomaticApproval, ModeratorReview, ReviewQueue,
    SharedReviewQueue,
};
pub use authorization::AuthorizationSource;
pub use catalog::{create_shared_role_catalog, GuildDirectory, SharedRoleCatalog};
pub use outcome::{Outcome, OutcomeApplier};
pub use prompt::DmPromptChannel;
pub use record::MemberRef;
pub use selector::CollegeMajorSelector;
pub use workflow::VerificationWorkflow;
