//! Mapped storage behind a region.
//!
//! A region is either a private anonymous mapping (threads of one process)
//! or a shared mapping of a file that independent processes map together.
//! File-backed regions also carry the cross-process half of the region
//! lock: an exclusive advisory lock on the file.

use crate::layout::{RegionHeader, REGION_HEADER_SIZE};
use fs2::FileExt;
use logring_core::{Error, Result};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub(crate) enum Backing {
    Anonymous {
        mmap: MmapMut,
    },
    File {
        file: File,
        path: PathBuf,
        mmap: MmapMut,
    },
}

fn map_file(file: &File, path: &Path) -> Result<MmapMut> {
    // SAFETY: the file is only resized by a holder of the exclusive file
    // lock, and every holder remaps before touching the data array.
    unsafe { MmapOptions::new().map_mut(file) }.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to map region file '{}': {}", path.display(), e),
        ))
    })
}

impl Backing {
    /// Private mapping holding an empty region.
    pub(crate) fn anonymous(capacity: usize) -> Result<Self> {
        let mmap = MmapMut::map_anon(REGION_HEADER_SIZE + capacity)?;
        let mut backing = Backing::Anonymous { mmap };
        backing.store_header(&RegionHeader::new(capacity as u32));
        Ok(backing)
    }

    /// Create (or truncate) a region file holding an empty region.
    pub(crate) fn create(path: &Path, capacity: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(path)?;
        file.set_len((REGION_HEADER_SIZE + capacity) as u64)?;
        let mmap = map_file(&file, path)?;

        let mut backing = Backing::File {
            file,
            path: path.to_path_buf(),
            mmap,
        };
        backing.store_header(&RegionHeader::new(capacity as u32));
        info!(target: "logring::region", path = %path.display(), capacity, "Created region file");
        Ok(backing)
    }

    /// Map an existing region file, checking its guard and size.
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        FileExt::lock_exclusive(&file)?;
        // Every error path drops the file, and closing it releases the lock
        let backing = Self::map_existing(file, path)?;
        backing.unlock_file();
        Ok(backing)
    }

    fn map_existing(file: File, path: &Path) -> Result<Self> {
        let len = file.metadata()?.len() as usize;
        if len < REGION_HEADER_SIZE {
            return Err(Error::corrupt_region(format!(
                "region file '{}' is only {} bytes",
                path.display(),
                len
            )));
        }
        let mmap = map_file(&file, path)?;
        let backing = Backing::File {
            file,
            path: path.to_path_buf(),
            mmap,
        };
        let header = backing.header();
        header.validate()?;
        if REGION_HEADER_SIZE + header.capacity as usize != len {
            return Err(Error::corrupt_region(format!(
                "region file '{}' is {} bytes but header capacity is {}",
                path.display(),
                len,
                header.capacity
            )));
        }
        debug!(target: "logring::region", path = %path.display(), capacity = header.capacity, "Opened region file");
        Ok(backing)
    }

    fn mmap(&self) -> &MmapMut {
        match self {
            Backing::Anonymous { mmap } | Backing::File { mmap, .. } => mmap,
        }
    }

    fn mmap_mut(&mut self) -> &mut MmapMut {
        match self {
            Backing::Anonymous { mmap } | Backing::File { mmap, .. } => mmap,
        }
    }

    pub(crate) fn path(&self) -> Option<&Path> {
        match self {
            Backing::Anonymous { .. } => None,
            Backing::File { path, .. } => Some(path.as_path()),
        }
    }

    /// Capacity of the local mapping's data array.
    pub(crate) fn mapped_capacity(&self) -> usize {
        self.mmap().len() - REGION_HEADER_SIZE
    }

    pub(crate) fn header(&self) -> RegionHeader {
        let mut raw = [0u8; REGION_HEADER_SIZE];
        raw.copy_from_slice(&self.mmap()[..REGION_HEADER_SIZE]);
        RegionHeader::from_bytes(&raw)
    }

    pub(crate) fn store_header(&mut self, header: &RegionHeader) {
        self.mmap_mut()[..REGION_HEADER_SIZE].copy_from_slice(&header.to_bytes());
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.mmap()[REGION_HEADER_SIZE..]
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.mmap_mut()[REGION_HEADER_SIZE..]
    }

    /// Take the cross-process lock. Anonymous regions have no other
    /// processes to exclude.
    pub(crate) fn lock_file(&self) -> Result<()> {
        if let Backing::File { file, .. } = self {
            FileExt::lock_exclusive(file)?;
        }
        Ok(())
    }

    pub(crate) fn unlock_file(&self) {
        if let Backing::File { file, path, .. } = self {
            if let Err(e) = FileExt::unlock(file) {
                tracing::warn!(
                    target: "logring::region",
                    path = %path.display(),
                    error = %e,
                    "Failed to release region file lock"
                );
            }
        }
    }

    /// Bring the local mapping in line with the shared header.
    ///
    /// Another process may have resized the region since this mapping was
    /// made; the header then names a capacity the mapping does not have.
    pub(crate) fn refresh(&mut self) -> Result<()> {
        let header = self.header();
        header.validate()?;
        let shared = header.capacity as usize;
        let mapped = self.mapped_capacity();
        if shared == mapped {
            return Ok(());
        }
        match self {
            Backing::Anonymous { .. } => Err(Error::corrupt_region(format!(
                "header capacity {} does not match mapped capacity {}",
                shared, mapped
            ))),
            Backing::File { file, path, mmap } => {
                let len = file.metadata()?.len() as usize;
                if len != REGION_HEADER_SIZE + shared {
                    return Err(Error::corrupt_region(format!(
                        "region file '{}' is {} bytes but header capacity is {}",
                        path.display(),
                        len,
                        shared
                    )));
                }
                *mmap = map_file(file, path)?;
                debug!(target: "logring::region", path = %path.display(), capacity = shared, "Remapped resized region");
                Ok(())
            }
        }
    }

    /// Replace the data array with one of `capacity` bytes.
    ///
    /// The header bytes are not carried over; the caller stores a fresh one.
    pub(crate) fn resize(&mut self, capacity: usize) -> Result<()> {
        match self {
            Backing::Anonymous { mmap } => {
                *mmap = MmapMut::map_anon(REGION_HEADER_SIZE + capacity)?;
            }
            Backing::File { file, path, mmap } => {
                file.set_len((REGION_HEADER_SIZE + capacity) as u64)?;
                *mmap = map_file(file, path)?;
            }
        }
        Ok(())
    }
}
