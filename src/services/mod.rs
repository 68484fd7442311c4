pub mod activity_writer;
pub mod amqp_publisher;
pub mod llm_service;
pub mod pdf_extractor;

pub use activity_writer::{ActivitySink, ActivityWriter};
pub use amqp_publisher::AmqpPublisher;
pub use llm_service::LlmService;
pub use pdf_extractor::{PdfIdeasExtractor, TextExtractor};
