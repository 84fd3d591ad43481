/**********************************************
  > File Name		: mod.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time     : Wed Mar 10 07:25:33 PM CST 2021
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * The Record Management component provides classes and methods for managing
 * files of unordered records.
 *
 * We will store records in paged files provided by the page_management
 * component. To manage file contents conveniently, we will use the first
 * page of each file as a special header page which contains free space
 * information.
 *
 * To simplify our task, we assume that every record in one page file are
 * the same size. Although record sizes may differ across files.
 */

pub mod bitmap;
pub mod page_handle;
pub mod record_file_handle;
pub mod record_file_manager;
pub mod record_scan;

use crate::page_management::disk_manager::PageNo;

pub const FILE_HDR_PAGE: PageNo = 0;
pub const FIRST_RECORD_PAGE: PageNo = 1;

//on disk value of "no page".
pub const INVALID_PAGE_NO: u32 = u32::MAX;

//num_records and next_free_page_no.
pub const PAGE_HDR_SIZE: usize = 8;

pub(crate) fn encode_page_no(page_no: Option<PageNo>) -> u32 {
    page_no.unwrap_or(INVALID_PAGE_NO)
}

pub(crate) fn decode_page_no(raw: u32) -> Option<PageNo> {
    if raw == INVALID_PAGE_NO {
        None
    } else {
        Some(raw)
    }
}
