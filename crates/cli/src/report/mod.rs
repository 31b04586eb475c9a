mod html;
mod log;

pub use html::HtmlReporter;
pub use log::LogReporter;
