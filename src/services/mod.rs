pub mod response_classifier;
pub mod status_writer;
pub mod template_session;

pub use response_classifier::{classify, parse_entity_list, success_phrase, Outcome};
pub use status_writer::StatusWriter;
pub use template_session::TemplateSession;
