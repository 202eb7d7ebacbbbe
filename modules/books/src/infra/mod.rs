pub mod accounts_directory;
pub mod storage;
