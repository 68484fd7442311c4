pub mod activity;
pub mod document;

pub use activity::{LogEntry, Notification, GENERATE_IDEAS_ACTION};
pub use document::{
    check_path_id, is_safe_path_id, DocId, ExistsResponse, RemoteResponse, UploadRequest,
    MARKDOWN_TYPE,
};
