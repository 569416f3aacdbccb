pub mod candidate;
pub mod css_path;
pub mod formatter;
pub mod generator;
