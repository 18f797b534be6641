//! contains parameters of a clustering run and file name utilities

pub mod parameters;

pub use parameters::*;


/// replaces characters that cannot appear in a file name by '_'
pub fn sanitize_file_stem(name : &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() || "._-".contains(c) { c } else { '_' }).collect()
} // end of sanitize_file_stem


#[cfg(test)]
mod tests {

use super::*;

#[test]
fn test_sanitize() {
    assert_eq!(sanitize_file_stem("sp|P01234|TOX_A"), "sp_P01234_TOX_A");
    assert_eq!(sanitize_file_stem("q1.2-b"), "q1.2-b");
    assert_eq!(sanitize_file_stem("a/b c"), "a_b_c");
}

} // end of mod tests
