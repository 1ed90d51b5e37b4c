pub mod app;
pub mod discovery;
pub mod event;
pub mod layout;
pub mod panel;
pub mod procscan;
pub mod session;
pub mod sessionlog;
pub mod tmux;
pub mod ui;
pub mod waiting;
