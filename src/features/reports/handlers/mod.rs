pub mod report_handler;

pub use report_handler::{__path_generate_report, generate_report};
