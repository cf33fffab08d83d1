pub mod history;
pub mod organize;
pub mod scan;
pub mod thumbnails;

pub use history::*;
pub use organize::*;
pub use scan::*;
pub use thumbnails::*;
