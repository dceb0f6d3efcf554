//! Application settings access port trait.

pub trait ConfigPort {
    /// Trimmed value of `[section] key`; blank values read as absent.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
