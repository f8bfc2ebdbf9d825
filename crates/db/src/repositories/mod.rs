//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod affiliate_repo;
pub mod carbon_registration_repo;
pub mod certificate_repo;
pub mod consultation_repo;
pub mod donation_repo;
pub mod news_repo;
pub mod order_repo;
pub mod product_repo;
pub mod project_repo;
pub mod role_repo;
pub mod session_repo;
pub mod user_repo;

pub use affiliate_repo::AffiliateRepo;
pub use carbon_registration_repo::CarbonRegistrationRepo;
pub use certificate_repo::CertificateRepo;
pub use consultation_repo::ConsultationRepo;
pub use donation_repo::DonationRepo;
pub use news_repo::NewsRepo;
pub use order_repo::OrderRepo;
pub use product_repo::ProductRepo;
pub use project_repo::ProjectRepo;
pub use role_repo::RoleRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
