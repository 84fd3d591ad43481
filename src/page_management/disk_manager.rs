/**********************************************
  > File Name		: disk_manager.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 13 Oct 2026 09:41:55 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Introduction:
 *
 * The DiskManager is the only component that touches files. It knows
 * files are cut into PAGE_SIZE blocks and nothing about what a page
 * contains.
 *
 * Page p of a file starts at byte p * PAGE_SIZE. Page numbers are handed
 * out by a per-descriptor counter which never goes back, the counter does
 * not look at the real file size, so a freshly allocated page has to be
 * written before it can be read.
 *
 * Besides pages, the DiskManager keeps an append-only log stream in the
 * file LOG_FILE_NAME. It only moves bytes, the framing belongs to the log
 * manager above. The log is written by a single writer: two appenders
 * racing on the end of file can overwrite each other.
 *
 * All relative paths are resolved against the root directory given to
 * DiskManager::new.
 */

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use crate::config::{LOG_FILE_NAME, PAGE_SIZE};
use crate::errors::PageFileError;
use crate::utils::lock;

pub type Fd = RawFd;
pub type PageNo = u32;

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    fp: Arc<File>,
}

#[derive(Debug, Default)]
struct OpenFiles {
    path2fd: HashMap<PathBuf, Fd>,
    fd2file: HashMap<Fd, OpenFile>,
}

#[derive(Debug)]
pub struct DiskManager {
    root: PathBuf,
    files: Mutex<OpenFiles>,
    next_page_nos: Mutex<HashMap<Fd, PageNo>>,
    log_fd: Mutex<Option<Fd>>,
}

impl DiskManager {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            files: Mutex::new(OpenFiles::default()),
            next_page_nos: Mutex::new(HashMap::new()),
            log_fd: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    fn page_offset(page_no: PageNo) -> u64 {
        page_no as u64 * PAGE_SIZE as u64
    }

    /*
     * The file table is only locked for the lookup, reads and writes run
     * on a shared handle without it.
     */
    fn file_of(&self, fd: Fd) -> Result<Arc<File>, PageFileError> {
        match lock(&self.files).fd2file.get(&fd) {
            Some(of) => Ok(Arc::clone(&of.fp)),
            None => Err(PageFileError::FileNotOpen(fd)),
        }
    }

    /*
     * Write data into page page_no of the file.
     * A short write is an error, we don't retry.
     */
    pub fn write_page(&self, fd: Fd, page_no: PageNo, data: &[u8]) -> Result<(), PageFileError> {
        let fp = self.file_of(fd)?;
        let write_bytes = fp.write_at(data, Self::page_offset(page_no))?;
        if write_bytes != data.len() {
            warn!("Incomplete write of page {} in fd {}: {}/{} bytes", page_no, fd, write_bytes, data.len());
            return Err(PageFileError::IncompleteWrite {
                expected: data.len(),
                actual: write_bytes,
            });
        }
        Ok(())
    }

    /*
     * Read buf.len() bytes from page page_no.
     * Reading past the end of the file is a short read, the buffer
     * is not zero filled.
     */
    pub fn read_page(&self, fd: Fd, page_no: PageNo, buf: &mut [u8]) -> Result<(), PageFileError> {
        let fp = self.file_of(fd)?;
        let read_bytes = fp.read_at(buf, Self::page_offset(page_no))?;
        if read_bytes != buf.len() {
            warn!("Incomplete read of page {} in fd {}: {}/{} bytes", page_no, fd, read_bytes, buf.len());
            return Err(PageFileError::IncompleteRead {
                expected: buf.len(),
                actual: read_bytes,
            });
        }
        Ok(())
    }

    pub fn allocate_page(&self, fd: Fd) -> PageNo {
        let mut next_page_nos = lock(&self.next_page_nos);
        let next = next_page_nos.entry(fd).or_insert(0);
        let page_no = *next;
        *next += 1;
        debug!("Allocate page {} in fd {}", page_no, fd);
        page_no
    }

    //page numbers are never reclaimed.
    pub fn deallocate_page(&self, _page_no: PageNo) {}

    pub fn next_page_no(&self, fd: Fd) -> PageNo {
        lock(&self.next_page_nos).get(&fd).copied().unwrap_or(0)
    }

    /*
     * Make the next allocate_page on fd return page_no.
     * Used when an existing file is opened: the counter has to start
     * after the pages already in the file.
     */
    pub fn set_next_page_no(&self, fd: Fd, page_no: PageNo) {
        lock(&self.next_page_nos).insert(fd, page_no);
    }

    pub fn is_file(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path.as_ref()).is_file()
    }

    pub fn is_dir(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path.as_ref()).is_dir()
    }

    pub fn create_dir(&self, path: impl AsRef<Path>) -> Result<(), PageFileError> {
        let path = self.resolve(path.as_ref());
        fs::create_dir(&path)?;
        info!("Create directory {:?}", path);
        Ok(())
    }

    pub fn destroy_dir(&self, path: impl AsRef<Path>) -> Result<(), PageFileError> {
        let path = self.resolve(path.as_ref());
        fs::remove_dir_all(&path)?;
        info!("Destroy directory {:?}", path);
        Ok(())
    }

    //a file is never silently overwritten.
    pub fn create_file(&self, path: impl AsRef<Path>) -> Result<(), PageFileError> {
        let path = self.resolve(path.as_ref());
        if path.is_file() {
            return Err(PageFileError::FileExists(path));
        }
        OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;
        info!("Create file {:?}", path);
        Ok(())
    }

    //an open file has to be closed before it can be destroyed.
    pub fn destroy_file(&self, path: impl AsRef<Path>) -> Result<(), PageFileError> {
        let path = self.resolve(path.as_ref());
        if !path.is_file() {
            return Err(PageFileError::FileNotFound(path));
        }
        if lock(&self.files).path2fd.contains_key(&path) {
            return Err(PageFileError::FileNotClosed(path));
        }
        fs::remove_file(&path)?;
        info!("Destroy file {:?}", path);
        Ok(())
    }

    /*
     * Open a file for reading and writing.
     * Opening an already opened file returns the same descriptor.
     */
    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<Fd, PageFileError> {
        let path = self.resolve(path.as_ref());
        let mut files = lock(&self.files);
        if let Some(fd) = files.path2fd.get(&path) {
            return Ok(*fd);
        }
        let fp = OpenOptions::new().read(true).write(true).open(&path)?;
        let fd = fp.as_raw_fd();
        files.path2fd.insert(path.clone(), fd);
        files.fd2file.insert(
            fd,
            OpenFile {
                path: path.clone(),
                fp: Arc::new(fp),
            },
        );
        info!("Open file {:?} as fd {}", path, fd);
        Ok(fd)
    }

    /*
     * Close a tracked descriptor.
     * The page counter of fd is dropped as well, the OS is free to hand
     * the same number to the next opened file.
     */
    pub fn close_file(&self, fd: Fd) -> Result<(), PageFileError> {
        let of = {
            let mut files = lock(&self.files);
            let of = match files.fd2file.remove(&fd) {
                Some(of) => of,
                None => return Err(PageFileError::FileNotOpen(fd)),
            };
            files.path2fd.remove(&of.path);
            of
        };
        lock(&self.next_page_nos).remove(&fd);
        {
            let mut log_fd = lock(&self.log_fd);
            if *log_fd == Some(fd) {
                *log_fd = None;
            }
        }
        of.fp.sync_all()?;
        info!("Close file {:?} with fd {}", of.path, fd);
        Ok(())
    }

    //None when the path does not exist.
    pub fn get_file_size(&self, path: impl AsRef<Path>) -> Option<u64> {
        fs::metadata(self.resolve(path.as_ref())).ok().map(|m| m.len())
    }

    pub fn get_file_name(&self, fd: Fd) -> Result<PathBuf, PageFileError> {
        match lock(&self.files).fd2file.get(&fd) {
            Some(of) => Ok(of.path.clone()),
            None => Err(PageFileError::FileNotOpen(fd)),
        }
    }

    //opens the file if it's not open yet.
    pub fn get_file_fd(&self, path: impl AsRef<Path>) -> Result<Fd, PageFileError> {
        self.open_file(path)
    }

    fn open_log(&self) -> Result<Fd, PageFileError> {
        let mut log_fd = lock(&self.log_fd);
        if let Some(fd) = *log_fd {
            return Ok(fd);
        }
        if !self.is_file(LOG_FILE_NAME) {
            self.create_file(LOG_FILE_NAME)?;
        }
        let fd = self.open_file(LOG_FILE_NAME)?;
        *log_fd = Some(fd);
        Ok(fd)
    }

    //append data at the end of the log file.
    pub fn write_log(&self, data: &[u8]) -> Result<(), PageFileError> {
        let fd = self.open_log()?;
        let fp = self.file_of(fd)?;
        let end = fp.metadata()?.len();
        let write_bytes = fp.write_at(data, end)?;
        if write_bytes != data.len() {
            warn!("Incomplete log write at {}: {}/{} bytes", end, write_bytes, data.len());
            return Err(PageFileError::IncompleteWrite {
                expected: data.len(),
                actual: write_bytes,
            });
        }
        Ok(())
    }

    /*
     * Read at most buf.len() bytes of the log starting at offset.
     * Returns the number of bytes read, 0 when offset is exactly the
     * end of the log.
     */
    pub fn read_log(&self, buf: &mut [u8], offset: u64) -> Result<usize, PageFileError> {
        let fd = self.open_log()?;
        let fp = self.file_of(fd)?;
        let size = fp.metadata()?.len();
        if offset > size {
            return Err(PageFileError::LogOffsetOutOfRange { offset, size });
        }
        let len = std::cmp::min(buf.len() as u64, size - offset) as usize;
        if len == 0 {
            return Ok(0);
        }
        let read_bytes = fp.read_at(&mut buf[..len], offset)?;
        if read_bytes != len {
            return Err(PageFileError::IncompleteRead {
                expected: len,
                actual: read_bytes,
            });
        }
        Ok(read_bytes)
    }
}
