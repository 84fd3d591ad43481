/**********************************************
  > File Name		: page_handle.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Oct 2026 11:26:09 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * A record page seen through its pin.
 *
 * Page data layout: page header | bitmap | records.
 *
 * page header: num_records (u32), next_free_page_no (u32), little endian.
 * The bitmap takes bitmap_size bytes, slot i starts at
 * PAGE_HDR_SIZE + bitmap_size + i * record_size.
 *
 * The handle owns the PageGuard, so it can't outlive the pin and
 * dropping it unpins the page. Writing through any *_mut accessor
 * marks the page dirty.
 */

use std::ops::Range;

use super::record_file_handle::RecordFileHeader;
use super::{decode_page_no, encode_page_no, PAGE_HDR_SIZE};
use crate::errors::RecordError;
use crate::page_management::buffer_manager::{PageGuard, PageId};
use crate::page_management::disk_manager::PageNo;
use crate::utils::{read_u32, write_u32};

const OFFSET_NUM_RECORDS: usize = 0;
const OFFSET_NEXT_FREE_PAGE_NO: usize = 4;
const OFFSET_BITMAP: usize = PAGE_HDR_SIZE;

#[derive(Debug)]
pub struct RecordPageHandle<'a> {
    page: PageGuard<'a>,
    record_size: usize,
    num_records_per_page: u32,
    bitmap_size: usize,
}

impl<'a> RecordPageHandle<'a> {
    pub(crate) fn new(page: PageGuard<'a>, file_hdr: &RecordFileHeader) -> Self {
        Self {
            page,
            record_size: file_hdr.record_size,
            num_records_per_page: file_hdr.num_records_per_page,
            bitmap_size: file_hdr.bitmap_size,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page.page_id()
    }

    pub fn page_no(&self) -> PageNo {
        self.page.page_no()
    }

    pub fn num_records(&self) -> u32 {
        read_u32(self.page.data(), OFFSET_NUM_RECORDS)
    }

    pub fn set_num_records(&mut self, num_records: u32) {
        write_u32(self.page.data_mut(), OFFSET_NUM_RECORDS, num_records);
    }

    pub fn is_full(&self) -> bool {
        self.num_records() >= self.num_records_per_page
    }

    pub fn next_free_page_no(&self) -> Option<PageNo> {
        decode_page_no(read_u32(self.page.data(), OFFSET_NEXT_FREE_PAGE_NO))
    }

    pub fn set_next_free_page_no(&mut self, page_no: Option<PageNo>) {
        write_u32(self.page.data_mut(), OFFSET_NEXT_FREE_PAGE_NO, encode_page_no(page_no));
    }

    pub fn bitmap(&self) -> &[u8] {
        &self.page.data()[OFFSET_BITMAP..OFFSET_BITMAP + self.bitmap_size]
    }

    pub fn bitmap_mut(&mut self) -> &mut [u8] {
        let size = self.bitmap_size;
        &mut self.page.data_mut()[OFFSET_BITMAP..OFFSET_BITMAP + size]
    }

    fn slot_range(&self, slot_no: u32) -> Result<Range<usize>, RecordError> {
        if slot_no >= self.num_records_per_page {
            return Err(RecordError::InvalidSlotNumber {
                slot_no,
                num_slots: self.num_records_per_page,
            });
        }
        let start = OFFSET_BITMAP + self.bitmap_size + slot_no as usize * self.record_size;
        Ok(start..start + self.record_size)
    }

    pub fn slot(&self, slot_no: u32) -> Result<&[u8], RecordError> {
        let range = self.slot_range(slot_no)?;
        Ok(&self.page.data()[range])
    }

    pub fn slot_mut(&mut self, slot_no: u32) -> Result<&mut [u8], RecordError> {
        let range = self.slot_range(slot_no)?;
        Ok(&mut self.page.data_mut()[range])
    }
}
