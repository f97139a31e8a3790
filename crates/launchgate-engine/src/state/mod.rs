pub mod atomic;
pub mod memory;
pub mod prefs_file;
