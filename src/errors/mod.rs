/**********************************************
  > File Name		: errors.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 02 Mar 2021 11:05:17 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Define some erros enum for global usage.
 *
 * Lifecycle misuse (creating an existing file, closing a file that is not
 * open...) always gets its own variant, so callers can tell a wrong call
 * from a failing disk.
 */

use std::path::PathBuf;
use thiserror::Error;

use crate::page_management::buffer_manager::PageId;
use crate::page_management::disk_manager::{Fd, PageNo};

#[derive(Error, Debug)]
pub enum PageFileError {
    #[error("unix I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("incomplete read: expected {expected} bytes, got {actual}")]
    IncompleteRead { expected: usize, actual: usize },

    #[error("incomplete write: expected {expected} bytes, wrote {actual}")]
    IncompleteWrite { expected: usize, actual: usize },

    #[error("file {0:?} already exists")]
    FileExists(PathBuf),

    #[error("file {0:?} does not exist")]
    FileNotFound(PathBuf),

    #[error("file {0:?} is still open")]
    FileNotClosed(PathBuf),

    #[error("file descriptor {0} is not open")]
    FileNotOpen(Fd),

    //returned by read_log when the offset is past the end of the log.
    #[error("log offset {offset} is beyond the log size {size}")]
    LogOffsetOutOfRange { offset: u64, size: u64 },

    #[error("all pages in the buffer pool are pinned")]
    AllPagesPinned,

    #[error("page {0:?} is still pinned")]
    PagePinned(PageId),
}

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("page {0} does not exist")]
    PageNotExist(PageNo),

    //a page taken from the free list has no free slot, the list is broken.
    #[error("page {0} is on the free list but full")]
    PageFull(PageNo),

    #[error("slot {slot_no} is out of range, a page holds {num_slots} records")]
    InvalidSlotNumber { slot_no: u32, num_slots: u32 },

    #[error("record size {0} cannot fit in a page")]
    InvalidRecordSize(usize),

    #[error("record data has {actual} bytes, the file record size is {expected}")]
    RecordSizeMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    PageFile(#[from] PageFileError),
}
