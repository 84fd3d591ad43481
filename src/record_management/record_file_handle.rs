/**********************************************
  > File Name		: record_file_handle.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 12 Apr 2021 11:01:57 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use log::{debug, error};

use super::bitmap;
use super::page_handle::RecordPageHandle;
use super::record_scan::RecordScan;
use super::{decode_page_no, encode_page_no, PAGE_HDR_SIZE};
use crate::config::PAGE_SIZE;
use crate::errors::RecordError;
use crate::page_management::buffer_manager::{BufferPoolManager, PageId};
use crate::page_management::disk_manager::{Fd, PageNo};
use crate::utils::{read_u32, write_u32};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rid {
    pub page_no: PageNo,
    pub slot_no: u32,
}

impl Rid {
    pub fn new(page_no: PageNo, slot_no: u32) -> Self {
        Self { page_no, slot_no }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub rid: Rid,
    pub data: Vec<u8>,
}

impl Record {
    pub fn new(rid: Rid, data: Vec<u8>) -> Self {
        Self { rid, data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/*
 * Every record file represents a table, every table has a same record
 * size.
 *
 * The header lives in page 0 of the file, record pages start at page 1.
 * num_pages counts the header page too.
 *
 * Pages that still have a free slot are chained through the
 * next_free_page_no of their page header, first_free_page_no is the
 * head of that chain. The chain is a stack: a page is pushed when it
 * stops being full and popped when it becomes full while on top.
 */
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordFileHeader {
    pub record_size: usize,
    pub num_records_per_page: u32,
    pub bitmap_size: usize,
    pub num_pages: u32,
    pub first_free_page_no: Option<PageNo>,
}

impl RecordFileHeader {
    /*
     * Header of an empty file.
     * Fails if not even one record of record_size fits in a page.
     */
    pub fn new(record_size: usize) -> Result<Self, RecordError> {
        let num_records_per_page = Self::calc_num_records_per_page(record_size);
        if num_records_per_page == 0 {
            error!("record size {} is too large for a page", record_size);
            return Err(RecordError::InvalidRecordSize(record_size));
        }
        Ok(Self {
            record_size,
            num_records_per_page: num_records_per_page as u32,
            bitmap_size: Self::calc_bitmap_size(num_records_per_page),
            num_pages: 1,
            first_free_page_no: None,
        })
    }

    //the largest n with header + bitmap + n records <= PAGE_SIZE.
    pub fn calc_num_records_per_page(record_size: usize) -> usize {
        if record_size == 0 || record_size > PAGE_SIZE {
            return 0;
        }
        let mut n = 8 * (PAGE_SIZE - PAGE_HDR_SIZE) / (8 * record_size + 1);
        while n > 0 && PAGE_HDR_SIZE + Self::calc_bitmap_size(n) + n * record_size > PAGE_SIZE {
            n -= 1;
        }
        n
    }

    pub fn calc_bitmap_size(num_records: usize) -> usize {
        (num_records + 7) / 8
    }

    pub fn encode(&self, buf: &mut [u8]) {
        write_u32(buf, 0, self.record_size as u32);
        write_u32(buf, 4, self.num_records_per_page);
        write_u32(buf, 8, self.bitmap_size as u32);
        write_u32(buf, 12, self.num_pages);
        write_u32(buf, 16, encode_page_no(self.first_free_page_no));
    }

    pub fn decode(buf: &[u8]) -> Self {
        Self {
            record_size: read_u32(buf, 0) as usize,
            num_records_per_page: read_u32(buf, 4),
            bitmap_size: read_u32(buf, 8) as usize,
            num_pages: read_u32(buf, 12),
            first_free_page_no: decode_page_no(read_u32(buf, 16)),
        }
    }
}

/*
 * Access to the records of one open record file.
 *
 * Everything that may change the file header takes &mut self, so there
 * is one writer per handle. Don't open two handles on the same file and
 * write through both: they would each keep their own copy of the free
 * list head.
 *
 * Every page is pinned through a RecordPageHandle and unpinned when the
 * handle goes out of scope, also on the error paths.
 */
#[derive(Debug)]
pub struct RecordFileHandle<'a> {
    pool: &'a BufferPoolManager,
    fd: Fd,
    file_hdr: RecordFileHeader,
}

impl<'a> RecordFileHandle<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, fd: Fd, file_hdr: RecordFileHeader) -> Self {
        Self { pool, fd, file_hdr }
    }

    pub fn fd(&self) -> Fd {
        self.fd
    }

    pub fn file_header(&self) -> &RecordFileHeader {
        &self.file_hdr
    }

    fn check_data(&self, data: &[u8]) -> Result<(), RecordError> {
        if data.len() != self.file_hdr.record_size {
            return Err(RecordError::RecordSizeMismatch {
                expected: self.file_hdr.record_size,
                actual: data.len(),
            });
        }
        Ok(())
    }

    //page range first, then the slot.
    fn check_rid(&self, rid: &Rid) -> Result<(), RecordError> {
        if rid.page_no >= self.file_hdr.num_pages {
            return Err(RecordError::PageNotExist(rid.page_no));
        }
        self.check_slot(rid.slot_no)
    }

    fn check_slot(&self, slot_no: u32) -> Result<(), RecordError> {
        if slot_no >= self.file_hdr.num_records_per_page {
            return Err(RecordError::InvalidSlotNumber {
                slot_no,
                num_slots: self.file_hdr.num_records_per_page,
            });
        }
        Ok(())
    }

    /*
     * Copy out the record at rid.
     * The occupancy bit is not checked, the caller is trusted to pass
     * the rid of a live record.
     */
    pub fn get_record(&self, rid: &Rid) -> Result<Record, RecordError> {
        self.check_rid(rid)?;
        let page = self.fetch_page_handle(rid.page_no)?;
        let data = page.slot(rid.slot_no)?.to_vec();
        Ok(Record::new(*rid, data))
    }

    pub fn is_record(&self, rid: &Rid) -> Result<bool, RecordError> {
        self.check_rid(rid)?;
        let page = self.fetch_page_handle(rid.page_no)?;
        Ok(bitmap::is_set(page.bitmap(), rid.slot_no as usize))
    }

    /*
     * Insert a record and returns its rid.
     * The record goes into the lowest free slot of the page on top of
     * the free list, a new page is allocated when the list is empty.
     */
    pub fn insert_record(&mut self, data: &[u8]) -> Result<Rid, RecordError> {
        self.check_data(data)?;
        let mut page = self.create_page_handle()?;
        let slot_no = match bitmap::first_bit(false, page.bitmap(), self.file_hdr.num_records_per_page as usize) {
            Some(v) => v as u32,
            None => {
                error!("page {} is on the free list but has no free slot", page.page_no());
                return Err(RecordError::PageFull(page.page_no()));
            }
        };
        page.slot_mut(slot_no)?.copy_from_slice(data);
        self.occupy_slot(&mut page, slot_no);
        Ok(Rid::new(page.page_no(), slot_no))
    }

    /*
     * Put a record back at a known rid, used when redoing an insert.
     * Neither the occupancy of the slot nor the free list membership of
     * the page is checked: inserting into an occupied slot counts the
     * record twice.
     */
    pub fn insert_record_at(&mut self, rid: &Rid, data: &[u8]) -> Result<(), RecordError> {
        self.check_data(data)?;
        self.check_rid(rid)?;
        let mut page = self.fetch_page_handle(rid.page_no)?;
        page.slot_mut(rid.slot_no)?.copy_from_slice(data);
        self.occupy_slot(&mut page, rid.slot_no);
        Ok(())
    }

    //set the bit and the count, pop the page off the free list if it became full.
    fn occupy_slot(&mut self, page: &mut RecordPageHandle<'_>, slot_no: u32) {
        bitmap::set(page.bitmap_mut(), slot_no as usize);
        let num_records = page.num_records() + 1;
        page.set_num_records(num_records);
        if num_records == self.file_hdr.num_records_per_page {
            self.file_hdr.first_free_page_no = page.next_free_page_no();
            debug!(
                "page {} is full, free list head is now {:?}",
                page.page_no(),
                self.file_hdr.first_free_page_no
            );
        }
    }

    /*
     * Deleting a record of a full page puts the page back on the free
     * list. Deleting an empty slot is not reported as an error, it leaves
     * the page as it is.
     */
    pub fn delete_record(&mut self, rid: &Rid) -> Result<(), RecordError> {
        self.check_rid(rid)?;
        let mut page = self.fetch_page_handle(rid.page_no)?;
        if !bitmap::is_set(page.bitmap(), rid.slot_no as usize) {
            debug!("delete of empty slot {:?} ignored", rid);
            return Ok(());
        }
        bitmap::reset(page.bitmap_mut(), rid.slot_no as usize);
        let num_records = page.num_records().saturating_sub(1);
        page.set_num_records(num_records);
        if num_records == self.file_hdr.num_records_per_page - 1 {
            self.release_page_handle(&mut page);
        }
        Ok(())
    }

    //overwrite the bytes of rid, the bitmap is left alone.
    pub fn update_record(&mut self, rid: &Rid, data: &[u8]) -> Result<(), RecordError> {
        self.check_data(data)?;
        self.check_rid(rid)?;
        let mut page = self.fetch_page_handle(rid.page_no)?;
        page.slot_mut(rid.slot_no)?.copy_from_slice(data);
        Ok(())
    }

    pub fn scan(&self) -> RecordScan<'_, 'a> {
        RecordScan::new(self)
    }

    pub fn fetch_page_handle(&self, page_no: PageNo) -> Result<RecordPageHandle<'a>, RecordError> {
        if page_no >= self.file_hdr.num_pages {
            return Err(RecordError::PageNotExist(page_no));
        }
        let pool: &'a BufferPoolManager = self.pool;
        let page = pool.fetch_page(PageId::new(self.fd, page_no))?;
        Ok(RecordPageHandle::new(page, &self.file_hdr))
    }

    /*
     * Allocate a fresh page, initialize its header and bitmap and push it
     * on the free list.
     */
    pub fn create_new_page_handle(&mut self) -> Result<RecordPageHandle<'a>, RecordError> {
        let pool: &'a BufferPoolManager = self.pool;
        let page = pool.new_page(self.fd)?;
        let mut page = RecordPageHandle::new(page, &self.file_hdr);
        debug_assert_eq!(page.page_no(), self.file_hdr.num_pages, "page counter out of step with the file header");

        bitmap::init(page.bitmap_mut());
        page.set_num_records(0);
        page.set_next_free_page_no(self.file_hdr.first_free_page_no);
        self.file_hdr.first_free_page_no = Some(page.page_no());
        self.file_hdr.num_pages += 1;
        debug!("new record page {} in fd {}", page.page_no(), self.fd);
        Ok(page)
    }

    //a page with at least one free slot.
    pub fn create_page_handle(&mut self) -> Result<RecordPageHandle<'a>, RecordError> {
        match self.file_hdr.first_free_page_no {
            Some(page_no) => {
                let page = self.fetch_page_handle(page_no)?;
                debug_assert!(!page.is_full(), "free list head {} is full", page_no);
                Ok(page)
            }
            None => self.create_new_page_handle(),
        }
    }

    //push a page that just stopped being full on the free list.
    pub fn release_page_handle(&mut self, page: &mut RecordPageHandle<'_>) {
        page.set_next_free_page_no(self.file_hdr.first_free_page_no);
        self.file_hdr.first_free_page_no = Some(page.page_no());
        debug!("page {} back on the free list", page.page_no());
    }
}
