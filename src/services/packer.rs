// ============================================================================
// 打包服务：按条目列表顺序写出 ZIP 归档
// 纯 Rust 函数，不依赖前端，方便单元测试
// ============================================================================

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::models::dtos::ArchiveReport;
use crate::models::entry::{Entry, EntrySource};
use crate::utils::error::{AppError, AppResult};

/// 流式复制缓冲区大小（64KB）
const COPY_BUFFER_SIZE: usize = 64 * 1024;

// ============================================================================
// 打包选项
// ============================================================================

/// 归档类型。目前只有 ZIP 真正实现，RAR / 7Z 仍写出 ZIP 容器。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArchiveKind {
    #[default]
    Zip,
    Rar,
    SevenZip,
}

impl ArchiveKind {
    pub fn label(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Rar => "rar",
            ArchiveKind::SevenZip => "7z",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArchiveKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(ArchiveKind::Zip),
            "rar" => Ok(ArchiveKind::Rar),
            "7z" | "7zip" | "sevenzip" => Ok(ArchiveKind::SevenZip),
            other => Err(AppError::ValidationError(format!(
                "不支持的归档类型：{}",
                other
            ))),
        }
    }
}

/// 成员压缩方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Compression {
    Stored,
    #[default]
    Deflated,
}

impl Compression {
    pub fn label(&self) -> &'static str {
        match self {
            Compression::Stored => "stored",
            Compression::Deflated => "deflated",
        }
    }

    fn method(&self) -> zip::CompressionMethod {
        match self {
            Compression::Stored => zip::CompressionMethod::Stored,
            Compression::Deflated => zip::CompressionMethod::Deflated,
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Compression {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stored" | "store" => Ok(Compression::Stored),
            "deflated" | "deflate" => Ok(Compression::Deflated),
            other => Err(AppError::ValidationError(format!(
                "不支持的压缩方式：{}",
                other
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub kind: ArchiveKind,
    pub compression: Compression,
}

// ============================================================================
// 进度回调
// ============================================================================

/// 打包进度接收方，每处理完一个条目推进一次（与实际写入字节数无关）
pub trait ProgressSink {
    fn start(&mut self, _total: usize) {}

    fn advance(&mut self, done: usize, total: usize);

    /// 无论成功失败都会在结束时调用一次，用于复位进度
    fn finish(&mut self) {}
}

/// 不关心进度时使用
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advance(&mut self, _done: usize, _total: usize) {}
}

// ============================================================================
// 打包
// ============================================================================

/// 验证条目列表非空
pub fn validate_entries(entries: &[Entry]) -> AppResult<()> {
    if entries.is_empty() {
        return Err(AppError::ValidationError(
            "没有可打包的文件或文件夹".to_string(),
        ));
    }
    Ok(())
}

/// 目标路径没有扩展名时补上 `.zip`
pub fn with_default_extension(destination: &Path) -> PathBuf {
    if destination.extension().is_some() {
        destination.to_path_buf()
    } else {
        destination.with_extension("zip")
    }
}

/// 按列表顺序将条目写入 ZIP 文件
///
/// - 虚拟文件夹跳过
/// - 目录只写出一个文件夹成员 `显示名称/`，其中的文件由列表里展开的文件条目提供，
///   因此从列表删除的文件不会出现在归档中
/// - 文件以显示名称作为成员路径
///
/// 已写入过的成员路径再次出现时跳过，指向输出文件本身的条目也跳过。
/// 整个归档作为一个整体，任何一步失败都会中止，已写出的部分文件保留在原处。
pub fn create_archive(
    entries: &[Entry],
    destination: &Path,
    options: ArchiveOptions,
    progress: &mut dyn ProgressSink,
) -> AppResult<ArchiveReport> {
    // 空列表在创建目标文件之前就拒绝
    validate_entries(entries)?;

    if options.kind != ArchiveKind::Zip {
        log::warn!(
            "归档类型 {} 尚未实现，仍以 ZIP 格式写出",
            options.kind
        );
    }

    let archive_path = with_default_extension(destination);
    let total = entries.len();
    let mut progress = scopeguard::guard(progress, |p| p.finish());
    progress.start(total);

    let file = std::fs::File::create(&archive_path).map_err(|e| {
        AppError::ArchiveError(format!(
            "无法创建 ZIP 文件 {}: {}",
            archive_path.display(),
            e
        ))
    })?;
    let archive_canonical = std::fs::canonicalize(&archive_path)?;
    let mut zip_writer = zip::ZipWriter::new(file);
    let mut written: HashSet<String> = HashSet::new();

    for (idx, entry) in entries.iter().enumerate() {
        match &entry.source {
            EntrySource::Virtual => {}
            EntrySource::Directory(_) => {
                write_folder(&mut zip_writer, &entry.display_name, options, &mut written)?;
            }
            EntrySource::File(path) => {
                if is_same_file(path, &archive_canonical) {
                    log::warn!(
                        "条目 {} 指向输出文件本身，跳过",
                        entry.display_name
                    );
                } else {
                    write_member(
                        &mut zip_writer,
                        path,
                        &entry.display_name,
                        options,
                        &mut written,
                    )?;
                }
            }
        }

        progress.advance(idx + 1, total);
    }

    zip_writer
        .finish()
        .map_err(|e| AppError::ArchiveError(format!("完成写入失败: {}", e)))?;

    let size_bytes = std::fs::metadata(&archive_path)?.len();
    let sha256 = file_sha256(&archive_path)?;

    log::info!(
        "归档完成：{}（{} 字节，{} 个成员）",
        archive_path.display(),
        size_bytes,
        written.len()
    );

    Ok(ArchiveReport {
        archive_path: archive_path.to_string_lossy().to_string(),
        size_bytes,
        entry_count: total,
        member_count: written.len(),
        sha256,
        kind: options.kind.label().to_string(),
    })
}

/// 写入单个文件成员，返回是否实际写入（重复的成员路径会被跳过）
fn write_member<W: Write + std::io::Seek>(
    zip_writer: &mut zip::ZipWriter<W>,
    path: &Path,
    member: &str,
    options: ArchiveOptions,
    written: &mut HashSet<String>,
) -> AppResult<bool> {
    if written.contains(member) {
        log::warn!("成员 {} 已写入，跳过 {}", member, path.display());
        return Ok(false);
    }

    let mut file = std::fs::File::open(path).map_err(|e| {
        AppError::ArchiveError(format!("读取文件失败 {}: {}", path.display(), e))
    })?;
    let size = file
        .metadata()
        .map_err(|e| AppError::ArchiveError(format!("读取文件失败 {}: {}", path.display(), e)))?
        .len();

    let file_options = zip::write::SimpleFileOptions::default()
        .compression_method(options.compression.method())
        .large_file(size >= u64::from(u32::MAX));

    zip_writer
        .start_file(member, file_options)
        .map_err(|e| AppError::ArchiveError(format!("添加文件失败 {}: {}", member, e)))?;
    stream_copy(&mut file, zip_writer)
        .map_err(|e| AppError::ArchiveError(format!("写入文件失败 {}: {}", member, e)))?;

    written.insert(member.to_string());
    log::debug!("写入成员 {} ← {}", member, path.display());
    Ok(true)
}

/// 写入文件夹成员（以 `/` 结尾），重复的路径跳过
fn write_folder<W: Write + std::io::Seek>(
    zip_writer: &mut zip::ZipWriter<W>,
    display_name: &str,
    options: ArchiveOptions,
    written: &mut HashSet<String>,
) -> AppResult<()> {
    let member = format!("{}/", display_name.trim_end_matches('/'));
    if !written.insert(member.clone()) {
        return Ok(());
    }

    let folder_options = zip::write::SimpleFileOptions::default()
        .compression_method(options.compression.method());
    zip_writer
        .add_directory(member.as_str(), folder_options)
        .map_err(|e| AppError::ArchiveError(format!("添加文件夹失败 {}: {}", member, e)))?;
    log::debug!("写入文件夹 {}", member);
    Ok(())
}

fn is_same_file(path: &Path, archive_canonical: &Path) -> bool {
    std::fs::canonicalize(path)
        .map(|p| p == archive_canonical)
        .unwrap_or(false)
}

/// 分块复制，避免大文件一次性加载到内存
fn stream_copy<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> std::io::Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// 计算文件的 SHA256（十六进制）
pub fn file_sha256(path: &Path) -> AppResult<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    stream_copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// 单元测试
// ============================================================================
