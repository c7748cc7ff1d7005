pub mod api;
pub mod config_loader;
pub mod http;
pub mod session;
pub mod storage;
pub mod tasks;
pub mod team_form;
