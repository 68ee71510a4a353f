// src/snapshot.rs
use crate::error::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Sideways,
    Back,
    BackCrouch,
}

impl SnapshotKind {
    pub fn label(self) -> &'static str {
        match self {
            SnapshotKind::Sideways => "sideways",
            SnapshotKind::Back => "back",
            SnapshotKind::BackCrouch => "back_crouch",
        }
    }

    /// Keys `1`, `2` and `3` select the view being captured.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            '1' => Some(SnapshotKind::Sideways),
            '2' => Some(SnapshotKind::Back),
            '3' => Some(SnapshotKind::BackCrouch),
            _ => None,
        }
    }
}

/// Writes annotated frames as `{view}_view_{n}.png`, one counter across views.
pub struct SnapshotWriter {
    dir: PathBuf,
    counter: u32,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            counter: 0,
        }
    }

    pub fn next_path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir
            .join(format!("{}_view_{}.png", kind.label(), self.counter))
    }

    pub fn save(&mut self, frame: &RgbImage, kind: SnapshotKind) -> Result<PathBuf> {
        let path = self.next_path(kind);
        if !self.dir.as_os_str().is_empty() {
            std::fs::create_dir_all(&self.dir)?;
        }
        frame.save(&path)?;
        self.counter += 1;

        tracing::info!("Saved {} snapshot to {}", kind.label(), path.display());
        Ok(path)
    }

    pub fn saved(&self) -> u32 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_views() {
        assert_eq!(SnapshotKind::from_key('1'), Some(SnapshotKind::Sideways));
        assert_eq!(SnapshotKind::from_key('2'), Some(SnapshotKind::Back));
        assert_eq!(SnapshotKind::from_key('3'), Some(SnapshotKind::BackCrouch));
        assert_eq!(SnapshotKind::from_key('4'), None);
    }

    #[test]
    fn counter_is_shared_across_views() {
        let dir = std::env::temp_dir().join(format!("snapshots_{}", uuid::Uuid::new_v4()));
        let mut writer = SnapshotWriter::new(&dir);
        let frame = RgbImage::new(8, 6);

        let first = writer.save(&frame, SnapshotKind::Back).unwrap();
        let second = writer.save(&frame, SnapshotKind::BackCrouch).unwrap();
        let third = writer.save(&frame, SnapshotKind::Sideways).unwrap();

        assert_eq!(first.file_name().unwrap(), "back_view_0.png");
        assert_eq!(second.file_name().unwrap(), "back_crouch_view_1.png");
        assert_eq!(third.file_name().unwrap(), "sideways_view_2.png");
        assert_eq!(writer.saved(), 3);

        let reloaded = image::open(&third).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (8, 6));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_save_does_not_advance_the_counter() {
        let mut writer = SnapshotWriter::new("/proc/definitely/not/writable");
        let frame = RgbImage::new(2, 2);

        assert!(writer.save(&frame, SnapshotKind::Back).is_err());
        assert_eq!(writer.saved(), 0);
    }
}
