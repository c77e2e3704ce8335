pub mod download;
pub mod reaper;
pub mod upload;
