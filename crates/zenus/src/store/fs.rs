//! # Filesystem Repository
//!
//! One markdown file per block, readable and editable by hand:
//!
//! ```text
//! <data_dir>/
//! ├── {id}.md            # active blocks
//! └── archive/
//!     └── {id}.md        # archived blocks
//! ```
//!
//! ## File Format
//!
//! ```text
//! <!-- {"title":"Plan","isCollapsed":false,"tags":["work"],"order":0,...} -->
//!
//! Markdown content...
//! ```
//!
//! The first line is an HTML comment carrying the metadata as JSON, followed by
//! a blank separator line and the content verbatim.
//!
//! Files without the metadata line (written by hand, or by older versions) are
//! still loaded: a leading `# Heading` becomes the title, otherwise the block
//! is `Untitled`. Such blocks sort after the ordered ones, by id.
//!
//! ## Writes
//!
//! Every write goes to a temp file which is then renamed over the target, so a
//! crash never leaves a half-written block. Writes are serialized through one
//! async lock: `update_orders` rewrites files read-modify-write and must not
//! interleave with a concurrent save of the same file.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::BlockRepository;
use crate::error::{Result, ZenusError};
use crate::model::{Block, BlockId, OrderUpdate, Space};

const ARCHIVE_DIR: &str = "archive";
const EXTENSION: &str = "md";
const HEADER_OPEN: &str = "<!-- ";
const HEADER_CLOSE: &str = " -->";
const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileHeader {
    #[serde(default)]
    title: String,
    #[serde(default)]
    is_collapsed: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    order: Option<u32>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// A block file as read from disk.
struct BlockFile {
    header: FileHeader,
    content: String,
}

impl BlockFile {
    fn parse(raw: &str) -> Self {
        let (first, rest) = raw.split_once('\n').unwrap_or((raw, ""));

        if let Some(json) = first
            .strip_prefix(HEADER_OPEN)
            .and_then(|s| s.strip_suffix(HEADER_CLOSE))
        {
            let header = serde_json::from_str(json).unwrap_or_default();
            let content = rest.strip_prefix('\n').unwrap_or(rest);
            return Self {
                header,
                content: content.to_string(),
            };
        }

        if let Some(title) = first.strip_prefix("# ") {
            return Self {
                header: FileHeader {
                    title: title.trim().to_string(),
                    ..Default::default()
                },
                content: rest.to_string(),
            };
        }

        Self {
            header: FileHeader {
                title: UNTITLED.to_string(),
                ..Default::default()
            },
            content: raw.to_string(),
        }
    }

    fn into_block(self, id: BlockId) -> Block {
        Block {
            id,
            title: self.header.title,
            content: self.content,
            tags: self.header.tags,
            is_collapsed: self.header.is_collapsed,
            order: self.header.order.unwrap_or(u32::MAX),
        }
    }

    fn render(&self) -> Result<String> {
        let header = serde_json::to_string(&self.header)?;
        Ok(format!(
            "{}{}{}\n\n{}",
            HEADER_OPEN, header, HEADER_CLOSE, self.content
        ))
    }
}

pub struct FsRepository {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn space_dir(&self, space: Space) -> PathBuf {
        match space {
            Space::Active => self.root.clone(),
            Space::Archived => self.root.join(ARCHIVE_DIR),
        }
    }

    /// Path of a block's file in a space (whether or not it exists).
    pub fn block_path(&self, space: Space, id: &BlockId) -> PathBuf {
        self.space_dir(space)
            .join(format!("{}.{}", id.as_str(), EXTENSION))
    }

    async fn read_file(&self, space: Space, id: &BlockId) -> Result<Option<BlockFile>> {
        match fs::read_to_string(self.block_path(space, id)).await {
            Ok(raw) => Ok(Some(BlockFile::parse(&raw))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ZenusError::Io(e)),
        }
    }

    async fn write_file(&self, space: Space, id: &BlockId, file: &BlockFile) -> Result<()> {
        let dir = self.space_dir(space);
        fs::create_dir_all(&dir).await?;

        let tmp = dir.join(format!(".{}-{}.tmp", id.as_str(), Uuid::new_v4()));
        fs::write(&tmp, file.render()?).await?;
        fs::rename(&tmp, self.block_path(space, id)).await?;
        Ok(())
    }

    async fn remove_file(&self, space: Space, id: &BlockId) -> Result<()> {
        match fs::remove_file(self.block_path(space, id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ZenusError::Io(e)),
        }
    }

    async fn read_space(&self, space: Space) -> Result<Vec<Block>> {
        let dir = self.space_dir(space);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ZenusError::Io(e)),
        };

        let mut blocks = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let raw = fs::read_to_string(&path).await?;
            blocks.push(BlockFile::parse(&raw).into_block(BlockId::new(stem)));
        }

        blocks.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Ok(blocks)
    }

    async fn move_block(&self, id: &BlockId, from: Space) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let to = from.other();

        let mut file = self
            .read_file(from, id)
            .await?
            .ok_or_else(|| ZenusError::BlockNotFound(id.clone()))?;

        let next_order = self
            .read_space(to)
            .await?
            .iter()
            .filter_map(|b| (b.order != u32::MAX).then_some(b.order + 1))
            .max()
            .unwrap_or(0);
        file.header.order = Some(next_order);
        file.header.updated_at = Some(Utc::now());

        self.write_file(to, id, &file).await?;
        self.remove_file(from, id).await
    }
}

#[async_trait]
impl BlockRepository for FsRepository {
    async fn load_notes(&self, space: Space) -> Result<Vec<Block>> {
        self.read_space(space).await
    }

    async fn save_block(&self, space: Space, block: &Block) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let created_at = self
            .read_file(space, &block.id)
            .await?
            .and_then(|f| f.header.created_at)
            .unwrap_or(now);

        let file = BlockFile {
            header: FileHeader {
                title: block.title.clone(),
                is_collapsed: block.is_collapsed,
                tags: block.tags.clone(),
                order: Some(block.order),
                created_at: Some(created_at),
                updated_at: Some(now),
            },
            content: block.content.clone(),
        };
        self.write_file(space, &block.id, &file).await
    }

    async fn delete_block(&self, space: Space, id: &BlockId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.remove_file(space, id).await
    }

    async fn update_orders(&self, space: Space, orders: &[OrderUpdate]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        for update in orders {
            let Some(mut file) = self.read_file(space, &update.id).await? else {
                continue;
            };
            if file.header.order == Some(update.order) {
                continue;
            }
            file.header.order = Some(update.order);
            self.write_file(space, &update.id, &file).await?;
        }
        Ok(())
    }

    async fn archive_block(&self, id: &BlockId) -> Result<()> {
        self.move_block(id, Space::Active).await
    }

    async fn unarchive_block(&self, id: &BlockId) -> Result<()> {
        self.move_block(id, Space::Archived).await
    }
}
