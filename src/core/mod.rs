pub mod error;
pub mod record;
pub mod reconcile;
pub mod run;
pub mod table;
pub mod types;
