//! # EST Upload
//!
//! Exercise Submission Tool (EST) 门户的客户端库
//!
//! 门户没有结构化 API，所有操作都是请求 HTML 页面并从特定标记中提取状态。
//!
//! ## 架构设计
//!
//! ### ① HTML 查询层（html）
//! - `html/` - 按 id、按标签和文本、按标签查找全部，以及相对导航
//! - 无状态，只依赖响应正文
//!
//! ### ② 门户客户端层（portal）
//! - `Session` - 唯一的会话 owner（cookie + 临时目录）
//! - `Endpoints` - 端点模板表
//! - `extract` - 把页面解析成领域数据
//! - `EstClient` - 登录、课程列表、上传、校验、状态、小组提交、版本检查
//!
//! ### ③ 运行层（app）
//! - `App` - 按配置执行一次完整的提交流程
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod html;
pub mod portal;
pub mod utils;

// 重新导出常用类型
pub use app::{App, RunReport, SubmissionReport};
pub use config::Config;
pub use error::{EstError, Result};
pub use portal::{
    EstClient, FileComparison, FileSlotId, FileSubmission, Lecture, PortalVersion, SubmissionStatus, VersionCheck,
};
