pub mod file_detail;
