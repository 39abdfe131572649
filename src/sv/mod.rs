pub mod attribution;
pub mod ledger;
pub mod plan;
pub mod sale;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use attribution::{DbAttributor, Recorded};
pub use ledger::Ledger;
pub use plan::Plan;
pub use sale::Sale;
pub use user::User;
