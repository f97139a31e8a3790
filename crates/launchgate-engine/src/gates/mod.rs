pub mod decision;
pub mod dispatch;
pub mod launch;
pub mod policy;
