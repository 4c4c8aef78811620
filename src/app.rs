use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::EstError;
use crate::portal::{EstClient, FileComparison, FileSubmission, Lecture, SubmissionStatus, VersionCheck};
use crate::utils::logging::{log_lectures, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    client: EstClient,
}

/// 一次运行的结果
#[derive(Debug, Default)]
pub struct RunReport {
    pub version: Option<VersionCheck>,
    pub lectures: Vec<Lecture>,
    pub submission: Option<SubmissionReport>,
    pub success: usize,
    pub failed: usize,
}

/// 提交任务的结果
#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub uploaded: bool,
    pub comparison: Option<FileComparison>,
    pub status: Option<SubmissionStatus>,
    pub partner_code: String,
    pub partner_name: Option<String>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        log_startup(&config.base_url, &config.known_version);

        let client = EstClient::new(&config).context("无法建立门户会话")?;

        Ok(Self { config, client })
    }

    /// 运行应用主逻辑
    ///
    /// 无论成功与否，结束时都会关闭会话。
    pub async fn run(self) -> Result<RunReport> {
        let App { config, client } = self;
        let outcome = run_steps(&config, &client).await;
        client.close();

        let report = outcome?;
        print_final_stats(report.success, report.failed);
        Ok(report)
    }
}

async fn run_steps(config: &Config, client: &EstClient) -> Result<RunReport> {
    let mut report = RunReport::default();

    // 版本检查（尽力而为）
    let version = client.check_version_compatibility().await?;
    match &version {
        VersionCheck::Compatible => {
            info!("✓ 门户版本兼容");
            report.success += 1;
        }
        VersionCheck::Mismatch(live) => {
            warn!("⚠️ 门户版本不匹配: 线上 '{}'，已知 '{}'", live, client.known_version());
            report.failed += 1;
        }
        VersionCheck::Unreachable => {
            warn!("⚠️ 无法连接到门户");
            report.failed += 1;
        }
    }
    report.version = Some(version);

    let Some((user, password)) = config.credentials() else {
        warn!("未配置登录信息 (EST_USER / EST_PASSWORD)，跳过后续步骤");
        return Ok(report);
    };
    client.authenticate(user, password).await?;
    report.success += 1;

    report.lectures = client.list_lectures().await?;
    log_lectures(&report.lectures);
    report.success += 1;

    if let Some(submission) = submission_from(config) {
        let submitted = process_submission(client, &submission, &mut report).await?;
        report.submission = Some(submitted);
    }

    Ok(report)
}

fn submission_from(config: &Config) -> Option<FileSubmission> {
    let lecture_id = config.lecture_id.as_ref()?;
    let file_path = config.file_path.as_ref()?;
    let file_name = config
        .file_name
        .clone()
        .or_else(|| file_path.file_name().map(|n| n.to_string_lossy().to_string()))?;

    let submission = FileSubmission::new(file_name, file_path.clone(), lecture_id.clone());
    Some(match &config.partner_code {
        Some(code) => submission.with_partner_code(code.clone()),
        None => submission,
    })
}

/// 处理提交任务：上传 → 校验 → 状态 → 小组信息
async fn process_submission(
    client: &EstClient,
    submission: &FileSubmission,
    report: &mut RunReport,
) -> Result<SubmissionReport> {
    let mut result = SubmissionReport::default();
    let name = submission.name.as_str();
    let lecture_id = submission.lecture_id.as_str();

    info!("📤 上传 {} 到课程 {}", name, lecture_id);
    match client.submit_file(submission).await {
        Ok(()) => {
            result.uploaded = true;
            report.success += 1;
        }
        Err(e @ (EstError::FileSlotNotFound { .. } | EstError::EmptyFileRejected { .. })) => {
            error!("❌ {}", e);
            report.failed += 1;
            return Ok(result);
        }
        Err(e @ EstError::SubmissionRejected { .. }) => {
            error!("❌ {}", e);
            report.failed += 1;
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("上传 {} 失败", name))),
    }

    match client.check_file(name, &submission.path, lecture_id).await {
        Ok(comparison) => {
            if comparison == FileComparison::Identical {
                info!("✓ 门户上的文件与本地一致");
                report.success += 1;
            } else {
                warn!("⚠️ 门户上的文件与本地不同");
                report.failed += 1;
            }
            result.comparison = Some(comparison);
        }
        Err(e @ EstError::ElementNotFound { .. }) => {
            warn!("⚠️ 无法校验: {}", e);
            report.failed += 1;
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("校验 {} 失败", name))),
    }

    let status = client.check_status(name, lecture_id).await?;
    match &status {
        SubmissionStatus::Reported(title) => info!("📋 状态: {}", title),
        SubmissionStatus::NoStatus => info!("📋 暂无状态"),
    }
    result.status = Some(status);

    result.partner_code = client.resolve_partner_code(name, lecture_id).await?;
    if !result.partner_code.is_empty() {
        result.partner_name = client.resolve_partner_name(&result.partner_code, lecture_id).await?;
        info!(
            "👥 小组提交码 {} ({})",
            result.partner_code,
            result.partner_name.as_deref().unwrap_or("未知")
        );
    }

    Ok(result)
}
