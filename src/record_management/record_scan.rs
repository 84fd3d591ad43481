/**********************************************
  > File Name		: record_scan.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Oct 2026 02:40:11 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use super::bitmap;
use super::record_file_handle::{RecordFileHandle, Rid};
use super::FIRST_RECORD_PAGE;
use crate::errors::RecordError;
use crate::page_management::disk_manager::PageNo;

/*
 * Walk through the rids of all records of a file, page by page, slot
 * by slot. Each step pins one page at a time.
 * The scan borrows the handle, the file can't change under it.
 */
pub struct RecordScan<'h, 'a> {
    handle: &'h RecordFileHandle<'a>,
    page_no: PageNo,
    slot_no: Option<usize>,
    done: bool,
}

impl<'h, 'a> RecordScan<'h, 'a> {
    pub fn new(handle: &'h RecordFileHandle<'a>) -> Self {
        Self {
            handle,
            page_no: FIRST_RECORD_PAGE,
            slot_no: None,
            done: false,
        }
    }
}

impl Iterator for RecordScan<'_, '_> {
    type Item = Result<Rid, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let file_hdr = *self.handle.file_header();
        while self.page_no < file_hdr.num_pages {
            let page = match self.handle.fetch_page_handle(self.page_no) {
                Ok(v) => v,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };
            let next = bitmap::next_bit(true, page.bitmap(), file_hdr.num_records_per_page as usize, self.slot_no);
            if let Some(slot_no) = next {
                self.slot_no = Some(slot_no);
                return Some(Ok(Rid::new(self.page_no, slot_no as u32)));
            }
            self.page_no += 1;
            self.slot_no = None;
        }
        self.done = true;
        None
    }
}
