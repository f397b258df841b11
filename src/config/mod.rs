pub mod authorizations;
pub mod majors;
pub mod verification;

pub use authorizations::{AuthorizationConfig, LEADERSHIP_CAPABILITY};
pub use majors::{College, MajorCatalogConfig};
pub use verification::{RoleNames, VerificationSettings};
