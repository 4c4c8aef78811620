//! EST 门户客户端层
//!
//! - `session` - 持有唯一的 HTTP 会话和临时目录
//! - `endpoints` - 端点模板表
//! - `extract` - HTML 到领域数据的解析
//! - `client` - 对外暴露的门户操作

pub mod client;
pub mod content;
pub mod endpoints;
pub mod extract;
pub mod session;
pub mod types;

pub use client::EstClient;
pub use endpoints::{Endpoint, Endpoints};
pub use session::Session;
pub use types::{
    FileComparison, FileSlotId, FileSubmission, Lecture, PortalVersion, SubmissionStatus, VersionCheck,
};
