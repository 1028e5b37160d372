use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 构建统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub posts: usize,
    pub categories: usize,
    pub outputs: usize,
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl BuildStats {
    fn record(&mut self, written: bool) {
        self.outputs += 1;
        if written {
            self.written += 1;
        } else {
            self.unchanged += 1;
        }
    }
}

/// 输出文件哈希缓存：内容未变且文件仍在时跳过写入，
/// 上次生成而本次未生成的文件在 `prune` 时删除
pub struct HashCache {
    hashes: HashMap<String, String>,
    emitted: HashSet<String>,
    force: bool,
    cache_path: PathBuf,
}

impl HashCache {
    /// 从缓存文件加载，不存在或损坏则返回空表
    pub fn load(cache_dir: &Path) -> Self {
        let cache_path = cache_dir.join("hashes.json");
        let hashes = std::fs::read_to_string(&cache_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        Self {
            hashes,
            emitted: HashSet::new(),
            force: false,
            cache_path,
        }
    }

    /// 持久化当前哈希表到缓存文件
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.hashes)?;
        std::fs::write(&self.cache_path, json)?;
        Ok(())
    }

    /// 本次构建忽略已有哈希，全部重写；旧记录保留用于清理孤儿文件
    pub fn force_rewrite(&mut self) {
        self.force = true;
    }

    /// SHA-256 十六进制摘要
    pub fn hash_bytes(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    pub fn has_changed(&self, key: &str, current_hash: &str) -> bool {
        self.force || self.hashes.get(key).is_none_or(|cached| cached != current_hash)
    }

    /// 写入 `output_dir/relative`，返回是否实际写入
    pub fn write_if_changed(
        &mut self,
        output_dir: &Path,
        relative: &str,
        data: &[u8],
    ) -> Result<bool> {
        self.emitted.insert(relative.to_owned());

        let target = output_dir.join(relative);
        let hash = Self::hash_bytes(data);
        if target.exists() && !self.has_changed(relative, &hash) {
            tracing::debug!("未变更，跳过：{}", target.display());
            return Ok(false);
        }

        write_atomic(&target, data)?;
        tracing::debug!("已写入：{}", target.display());

        self.hashes.insert(relative.to_owned(), hash);
        Ok(true)
    }

    /// 写入并计入统计
    pub fn emit(
        &mut self,
        stats: &mut BuildStats,
        output_dir: &Path,
        relative: &str,
        data: &[u8],
    ) -> Result<()> {
        let written = self.write_if_changed(output_dir, relative, data)?;
        stats.record(written);
        Ok(())
    }

    /// 删除上次生成、本次未再生成的输出文件及其哈希记录，返回删除数量。
    /// 只处理缓存中记录过的文件，输出目录中的其他文件不受影响
    pub fn prune(&mut self, output_dir: &Path) -> Result<usize> {
        let mut stale: Vec<String> = self
            .hashes
            .keys()
            .filter(|k| !self.emitted.contains(*k))
            .cloned()
            .collect();
        stale.sort();

        for relative in &stale {
            let target = output_dir.join(relative);
            if target.exists() {
                std::fs::remove_file(&target)
                    .with_context(|| format!("删除过期输出 {} 失败", target.display()))?;
                tracing::info!("已删除过期输出：{}", relative);
                remove_empty_parents(output_dir, &target);
            }
            self.hashes.remove(relative);
        }
        Ok(stale.len())
    }
}

/// 先写入同目录临时文件再重命名，中途失败不会留下截断的目标文件
fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .with_context(|| format!("无效的输出路径：{}", target.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("创建目录 {} 失败", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("在 {} 创建临时文件失败", parent.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("写入 {} 失败", target.display()))?;
    // 临时文件默认 0600，发布的静态文件需要可读
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .with_context(|| format!("设置 {} 权限失败", target.display()))?;
    }
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("替换 {} 失败", target.display()))?;
    Ok(())
}

/// 自下而上删除空目录，直到 output_dir 或遇到非空目录
fn remove_empty_parents(output_dir: &Path, file: &Path) {
    let mut dir = file.parent();
    while let Some(d) = dir {
        if d == output_dir || !d.starts_with(output_dir) || std::fs::remove_dir(d).is_err() {
            break;
        }
        dir = d.parent();
    }
}
