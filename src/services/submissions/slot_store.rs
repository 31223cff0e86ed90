//! 提交文件的磁盘存储
//!
//! 布局：`{root}/{student_id}/{series}_{part}.{ext}`。每个提交槽位至多保留一个文件。

use std::fmt::Display;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use actix_web::web::Bytes;
use futures_util::{Stream, StreamExt, pin_mut};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{PortalError, Result};
use crate::models::groups::entities::ProjectGroup;

/// 提交槽位：某学生在某分组下的唯一提交
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub student_id: i64,
    pub key: String,
}

impl Slot {
    pub fn new(student_id: i64, group: &ProjectGroup) -> Self {
        Self {
            student_id,
            key: group.storage_key(),
        }
    }

    /// 存储文件名，如 `3_1.pdf`
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.key, extension)
    }

    fn matches(&self, file_name: &str) -> bool {
        file_name
            .strip_prefix(self.key.as_str())
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct SlotStore {
    root: PathBuf,
}

impl SlotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn student_dir(&self, student_id: i64) -> PathBuf {
        self.root.join(student_id.to_string())
    }

    pub fn file_path(&self, slot: &Slot, extension: &str) -> PathBuf {
        self.student_dir(slot.student_id)
            .join(slot.file_name(extension))
    }

    /// 用新内容替换槽位中的文件
    ///
    /// 内容先流式写入同目录下的隐藏临时文件，写完并落盘后删除槽位中的旧文件，
    /// 再重命名到位。任何一步失败都会清理临时文件；旧文件只在新内容完整后才会被删除。
    pub async fn replace<S, E>(&self, slot: &Slot, extension: &str, body: S) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let dir = self.student_dir(slot.student_id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            PortalError::file_operation(format!("创建目录 {} 失败: {e}", dir.display()))
        })?;

        let tmp_path = dir.join(format!(".tmp-{}", Uuid::new_v4()));
        let size = match write_stream(&tmp_path, body).await {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(e);
            }
        };

        if let Err(e) = self.remove_slot_files(slot).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e);
        }

        let final_path = self.file_path(slot, extension);
        if let Err(e) = fs::rename(&tmp_path, &final_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(PortalError::file_operation(format!(
                "保存文件 {} 失败: {e}",
                final_path.display()
            )));
        }

        debug!("Stored {} ({} bytes)", final_path.display(), size);
        Ok(StoredFile {
            path: final_path,
            size,
        })
    }

    /// 查找槽位中扩展名为 `extension` 的文件
    pub async fn locate(&self, slot: &Slot, extension: &str) -> Result<Option<StoredFile>> {
        let path = self.file_path(slot, extension);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(StoredFile {
                path,
                size: meta.len(),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除槽位中所有 `{key}.*` 文件，返回删除数量
    async fn remove_slot_files(&self, slot: &Slot) -> Result<usize> {
        let dir = self.student_dir(slot.student_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !slot.matches(name) || !entry.file_type().await?.is_file() {
                continue;
            }
            fs::remove_file(entry.path()).await.map_err(|e| {
                PortalError::file_operation(format!("删除旧文件 {name} 失败: {e}"))
            })?;
            debug!("Removed previous submission {}", name);
            removed += 1;
        }
        Ok(removed)
    }

    /// 槽位中现存的文件名
    #[cfg(test)]
    pub(crate) async fn slot_files(&self, slot: &Slot) -> Vec<String> {
        let mut names = Vec::new();
        if let Ok(mut entries) = fs::read_dir(self.student_dir(slot.student_id)).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().into_owned();
                if slot.matches(&name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        names
    }
}

async fn write_stream<S, E>(path: &Path, body: S) -> Result<u64>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Display,
{
    let mut file = File::create(path)
        .await
        .map_err(|e| PortalError::file_operation(format!("创建临时文件失败: {e}")))?;

    let mut size: u64 = 0;
    pin_mut!(body);
    while let Some(chunk) = body.next().await {
        let chunk =
            chunk.map_err(|e| PortalError::file_operation(format!("上传数据流中断: {e}")))?;
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(size)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures_util::stream;

    pub(crate) fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("portal-test-{}", Uuid::new_v4()))
    }

    fn slot(student_id: i64, key: &str) -> Slot {
        Slot {
            student_id,
            key: key.to_string(),
        }
    }

    fn body(parts: &[&'static [u8]]) -> impl Stream<Item = std::result::Result<Bytes, String>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(Bytes::from_static(*p)))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn test_slot_matching() {
        let s = slot(1, "3_1");
        assert!(s.matches("3_1.pdf"));
        assert!(s.matches("3_1.docx"));
        assert!(!s.matches("3_10.pdf"));
        assert!(!s.matches("3_1"));
        assert!(!s.matches(".tmp-3_1.pdf"));
        assert!(!s.matches("13_1.pdf"));
    }

    #[tokio::test]
    async fn test_replace_writes_file() {
        let store = SlotStore::new(temp_root());
        let s = slot(7, "3_1");

        let stored = store
            .replace(&s, "pdf", body(&[b"hello ", b"world"]))
            .await
            .unwrap();
        assert_eq!(stored.size, 11);
        assert_eq!(stored.path, store.root().join("7").join("3_1.pdf"));
        assert_eq!(fs::read(&stored.path).await.unwrap(), b"hello world");

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_replace_with_other_extension_keeps_one_file() {
        let store = SlotStore::new(temp_root());
        let s = slot(7, "3_1");

        store.replace(&s, "pdf", body(&[b"v1"])).await.unwrap();
        store.replace(&s, "docx", body(&[b"v2"])).await.unwrap();

        assert_eq!(store.slot_files(&s).await, vec!["3_1.docx".to_string()]);
        assert!(store.locate(&s, "pdf").await.unwrap().is_none());
        let found = store.locate(&s, "docx").await.unwrap().unwrap();
        assert_eq!(fs::read(&found.path).await.unwrap(), b"v2");

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_other_slots_untouched() {
        let store = SlotStore::new(temp_root());
        let first = slot(7, "3_1");
        let second = slot(7, "3_10");

        store.replace(&first, "pdf", body(&[b"a"])).await.unwrap();
        store.replace(&second, "pdf", body(&[b"b"])).await.unwrap();
        store.replace(&first, "txt", body(&[b"c"])).await.unwrap();

        assert_eq!(store.slot_files(&first).await, vec!["3_1.txt".to_string()]);
        assert_eq!(
            store.slot_files(&second).await,
            vec!["3_10.pdf".to_string()]
        );

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_failed_stream_keeps_previous_file() {
        let store = SlotStore::new(temp_root());
        let s = slot(7, "3_1");
        store.replace(&s, "pdf", body(&[b"good"])).await.unwrap();

        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err("connection reset".to_string()),
        ]);
        let err = store.replace(&s, "docx", broken).await.unwrap_err();
        assert!(matches!(err, PortalError::FileOperation(_)));

        assert_eq!(store.slot_files(&s).await, vec!["3_1.pdf".to_string()]);
        let mut entries = fs::read_dir(store.student_dir(7)).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            assert!(!entry.file_name().to_string_lossy().starts_with(".tmp-"));
        }

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_locate_missing() {
        let store = SlotStore::new(temp_root());
        assert!(store.locate(&slot(1, "1_1"), "pdf").await.unwrap().is_none());
    }
}
