pub mod path;

pub use path::{project_label, shorten_path_for_display};
