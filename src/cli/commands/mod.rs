pub mod add;
pub mod completions;
pub mod delete;
pub mod export;
pub mod import_cmd;
pub mod init;
pub mod list;
pub mod show;
pub mod verify;
