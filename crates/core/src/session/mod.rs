pub mod file_store;
pub mod inspection_session;
