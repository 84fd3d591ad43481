/**********************************************
  > File Name		: record_file_manager.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 12 Apr 2021 09:48:43 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use std::path::Path;

use log::info;

use super::record_file_handle::{RecordFileHandle, RecordFileHeader};
use super::FILE_HDR_PAGE;
use crate::config::PAGE_SIZE;
use crate::errors::RecordError;
use crate::page_management::buffer_manager::BufferPoolManager;

/*
 * RecordFileManager is an encapsulation of the DiskManager, as records
 * module use page files to store records.
 * When need to create a new records file, page 0 is first written with
 * the record file header. The header is kept in the handle while the
 * file is open and written back when it's closed.
 */
#[derive(Debug)]
pub struct RecordFileManager<'a> {
    pool: &'a BufferPoolManager,
}

impl<'a> RecordFileManager<'a> {
    pub fn new(pool: &'a BufferPoolManager) -> Self {
        Self { pool }
    }

    pub fn create_file(&self, path: impl AsRef<Path>, record_size: usize) -> Result<(), RecordError> {
        let file_hdr = RecordFileHeader::new(record_size)?;
        let disk = self.pool.disk();
        disk.create_file(path.as_ref())?;
        let fd = disk.open_file(path.as_ref())?;

        let mut buf = vec![0u8; PAGE_SIZE];
        file_hdr.encode(&mut buf);
        let written = disk.write_page(fd, FILE_HDR_PAGE, &buf);
        disk.close_file(fd)?;
        written?;
        info!(
            "Create record file {:?}: record_size = {}, {} records per page",
            path.as_ref(),
            record_size,
            file_hdr.num_records_per_page
        );
        Ok(())
    }

    pub fn destroy_file(&self, path: impl AsRef<Path>) -> Result<(), RecordError> {
        self.pool.disk().destroy_file(path)?;
        Ok(())
    }

    pub fn open_file(&self, path: impl AsRef<Path>) -> Result<RecordFileHandle<'a>, RecordError> {
        let disk = self.pool.disk();
        let fd = disk.open_file(path.as_ref())?;
        let mut buf = vec![0u8; PAGE_SIZE];
        disk.read_page(fd, FILE_HDR_PAGE, &mut buf)?;
        let file_hdr = RecordFileHeader::decode(&buf);
        //new pages go after the ones already in the file.
        disk.set_next_page_no(fd, file_hdr.num_pages);
        info!("Open record file {:?} as fd {}: {:?}", path.as_ref(), fd, file_hdr);
        Ok(RecordFileHandle::new(self.pool, fd, file_hdr))
    }

    /*
     * Flush and drop the pages of the file, write the header back and
     * close the descriptor. The handle must not have pages pinned.
     *
     * On failure the handle keeps the only up to date header, so the
     * caller can release its pages and close again.
     */
    pub fn close_file(&self, handle: &mut RecordFileHandle<'a>) -> Result<(), RecordError> {
        let disk = self.pool.disk();
        let fd = handle.fd();
        self.pool.remove_all_pages(fd)?;

        let mut buf = vec![0u8; PAGE_SIZE];
        handle.file_header().encode(&mut buf);
        disk.write_page(fd, FILE_HDR_PAGE, &buf)?;
        disk.close_file(fd)?;
        info!("Close record file with fd {}", fd);
        Ok(())
    }
}
