pub mod auto_resolve;
pub mod common;
pub mod history;
pub mod import;
pub mod list;
pub mod resolve;
pub mod show;
pub mod stats;
pub mod suggest;
pub mod versions;
