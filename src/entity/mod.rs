pub mod attribution;
pub mod commission;
pub mod commission_plan;
pub mod sale;
pub mod user;

pub use commission::CommissionStatus;
pub use sale::SaleStatus;
pub use user::UserStatus;
