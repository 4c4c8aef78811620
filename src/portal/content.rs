//! 本地文件内容工具：类型探测和逐字节比较

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{EstError, Result};

/// 空文件的 MIME 类型
pub const EMPTY_MIME: &str = "inode/x-empty";
const TEXT_MIME: &str = "text/plain";
const BINARY_MIME: &str = "application/octet-stream";

/// 探测类型时读取的文件头长度
const SNIFF_LEN: usize = 8192;
const COMPARE_BUF: usize = 64 * 1024;

/// 根据文件内容（而不是扩展名）判断 MIME 类型
pub async fn sniff(path: &Path) -> Result<String> {
    let mut file = File::open(path).await.map_err(|e| EstError::io(path, e))?;
    let mut head = vec![0u8; SNIFF_LEN];
    let len = read_full(&mut file, &mut head)
        .await
        .map_err(|e| EstError::io(path, e))?;
    head.truncate(len);
    Ok(sniff_bytes(&head).to_string())
}

/// 根据文件头判断 MIME 类型
pub fn sniff_bytes(head: &[u8]) -> &'static str {
    if head.is_empty() {
        return EMPTY_MIME;
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type();
    }
    match std::str::from_utf8(head) {
        Ok(_) => TEXT_MIME,
        // 只在文件头末尾截断了一个多字节字符
        Err(e) if e.error_len().is_none() => TEXT_MIME,
        Err(_) => BINARY_MIME,
    }
}

/// 逐字节比较两个文件的内容
pub async fn same_content(a: &Path, b: &Path) -> Result<bool> {
    let len_a = tokio::fs::metadata(a).await.map_err(|e| EstError::io(a, e))?.len();
    let len_b = tokio::fs::metadata(b).await.map_err(|e| EstError::io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }

    let mut file_a = File::open(a).await.map_err(|e| EstError::io(a, e))?;
    let mut file_b = File::open(b).await.map_err(|e| EstError::io(b, e))?;
    let mut buf_a = vec![0u8; COMPARE_BUF];
    let mut buf_b = vec![0u8; COMPARE_BUF];

    loop {
        let n_a = read_full(&mut file_a, &mut buf_a).await.map_err(|e| EstError::io(a, e))?;
        let n_b = read_full(&mut file_b, &mut buf_b).await.map_err(|e| EstError::io(b, e))?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// 读满缓冲区或读到文件末尾，返回读到的字节数
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
