/**********************************************
  > File Name		: buffer_manager.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Mon 01 Mar 2021 07:52:27 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error};

use super::disk_manager::{DiskManager, Fd, PageNo};
use crate::config::PAGE_SIZE;
use crate::errors::PageFileError;
use crate::utils::lock;

/*
 * Memory and References.
 *
 * Buffer Pages Storage:
 * All frames are allocated when the pool is created and never move,
 * each frame sits behind its own mutex. The mutex is the page latch:
 * whoever pins a page holds the latch of its frame until the pin is
 * released, so one page buffer is never seen half written.
 *
 * The bookkeeping (which page is in which frame, pin counts, the unused
 * list) lives in PoolState behind another mutex. The lock order is
 * always state first, frame second. A PageGuard releases its frame
 * latch before it goes back to the state to unpin.
 *
 * A thread must not pin the same page twice at the same time, the
 * second fetch would wait for a latch it holds itself.
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub fd: Fd,
    pub page_no: PageNo,
}

impl PageId {
    pub fn new(fd: Fd, page_no: PageNo) -> Self {
        Self { fd, page_no }
    }
}

#[derive(Debug)]
struct Frame {
    data: Vec<u8>,
    dirty: bool,
}

#[derive(Debug, Default)]
struct FrameMeta {
    page_id: Option<PageId>,
    pin_count: u32,
    prev: Option<usize>,
    next: Option<usize>,
}

/*
 * Unpinned frames are linked in the unused list, first is the most
 * recently unpinned one, last is the next victim.
 * Frames holding no page at all are kept in free.
 */
#[derive(Debug)]
struct PoolState {
    metas: Vec<FrameMeta>,
    first: Option<usize>,
    last: Option<usize>,
    free: Vec<usize>,
    page_table: HashMap<PageId, usize>,
}

impl PoolState {
    fn new(pool_size: usize) -> Self {
        Self {
            metas: (0..pool_size).map(|_| FrameMeta::default()).collect(),
            first: None,
            last: None,
            //pop() hands out frame 0 first.
            free: (0..pool_size).rev().collect(),
            page_table: HashMap::new(),
        }
    }

    //put a frame at the head of the unused list.
    fn link(&mut self, index: usize) {
        let old_first = self.first;
        {
            let meta = &mut self.metas[index];
            meta.prev = None;
            meta.next = old_first;
        }
        if let Some(f) = old_first {
            self.metas[f].prev = Some(index);
        }
        self.first = Some(index);
        if self.last.is_none() {
            self.last = Some(index);
        }
    }

    //remove a frame from the unused list.
    fn unlink(&mut self, index: usize) {
        let (prev, next) = {
            let meta = &mut self.metas[index];
            let pn = (meta.prev, meta.next);
            meta.prev = None;
            meta.next = None;
            pn
        };
        match prev {
            None => self.first = next,
            Some(p) => self.metas[p].next = next,
        }
        match next {
            None => self.last = prev,
            Some(n) => self.metas[n].prev = prev,
        }
    }

    fn is_linked(&self, index: usize) -> bool {
        self.first == Some(index) || self.metas[index].prev.is_some()
    }

    fn pin(&mut self, index: usize) {
        if self.metas[index].pin_count == 0 && self.is_linked(index) {
            self.unlink(index);
        }
        self.metas[index].pin_count += 1;
    }

    fn forget(&mut self, index: usize) {
        if let Some(page_id) = self.metas[index].page_id.take() {
            self.page_table.remove(&page_id);
        }
        self.metas[index].pin_count = 0;
        self.free.push(index);
    }
}

/*
 * Accessing data on a page of a file requires first reading
 * the page into a buffer pool in main memory. While a page
 * is in memory and its data is available for manipulation,
 * the page is said to be "pinned". After the manipulation
 * is done, the page is "unpinned". Unpinning a page does
 * not necessarily cause the page to be removed from the buffer.
 * An unpinned page is kept in memory as long as its space in
 * the buffer pool is not needed. When it is needed, the least
 * recently unpinned page is written back if it's dirty and its
 * frame is reused.
 */
#[derive(Debug)]
pub struct BufferPoolManager {
    disk: Arc<DiskManager>,
    frames: Vec<Mutex<Frame>>,
    state: Mutex<PoolState>,
}

impl BufferPoolManager {
    pub fn new(pool_size: usize, disk: Arc<DiskManager>) -> Self {
        debug!("buffer pool size = {}", pool_size);
        Self {
            disk,
            frames: (0..pool_size)
                .map(|_| {
                    Mutex::new(Frame {
                        data: vec![0; PAGE_SIZE],
                        dirty: false,
                    })
                })
                .collect(),
            state: Mutex::new(PoolState::new(pool_size)),
        }
    }

    pub fn disk(&self) -> &Arc<DiskManager> {
        &self.disk
    }

    pub fn pool_size(&self) -> usize {
        self.frames.len()
    }

    //number of pages currently in the buffer.
    pub fn num_resident_pages(&self) -> usize {
        lock(&self.state).page_table.len()
    }

    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = lock(&self.state);
        state.page_table.get(&page_id).map(|i| state.metas[*i].pin_count)
    }

    /*
     * Find a frame for a new page: a free frame if there is one, or
     * the least recently unpinned page, written back if it's dirty.
     * The returned frame is out of the page table and the unused list.
     */
    fn find_victim(&self, state: &mut PoolState) -> Result<usize, PageFileError> {
        if let Some(index) = state.free.pop() {
            return Ok(index);
        }
        let index = match state.last {
            Some(v) => v,
            None => {
                error!("No free frame, all {} pages pinned", self.frames.len());
                return Err(PageFileError::AllPagesPinned);
            }
        };
        if let Some(old) = state.metas[index].page_id {
            let mut frame = lock(&self.frames[index]);
            if frame.dirty {
                self.disk.write_page(old.fd, old.page_no, &frame.data)?;
                frame.dirty = false;
            }
            debug!("Evict page {:?} from frame {}", old, index);
        }
        state.unlink(index);
        if let Some(old) = state.metas[index].page_id.take() {
            state.page_table.remove(&old);
        }
        Ok(index)
    }

    fn guard(&self, index: usize, page_id: PageId) -> PageGuard<'_> {
        PageGuard {
            frame: lock(&self.frames[index]),
            pin: Pin {
                pool: self,
                index,
                page_id,
            },
        }
    }

    pub fn fetch_page(&self, page_id: PageId) -> Result<PageGuard<'_>, PageFileError> {
        let index = {
            let mut state = lock(&self.state);
            match state.page_table.get(&page_id).copied() {
                Some(index) => {
                    debug!("Getting page {:?} from buffer", page_id);
                    state.pin(index);
                    index
                }
                None => {
                    debug!("Reading page {:?} from file", page_id);
                    let index = self.find_victim(&mut state)?;
                    {
                        let mut frame = lock(&self.frames[index]);
                        if let Err(e) = self.disk.read_page(page_id.fd, page_id.page_no, &mut frame.data) {
                            drop(frame);
                            state.free.push(index);
                            return Err(e);
                        }
                        frame.dirty = false;
                    }
                    state.metas[index].page_id = Some(page_id);
                    state.metas[index].pin_count = 1;
                    state.page_table.insert(page_id, index);
                    index
                }
            }
        };
        Ok(self.guard(index, page_id))
    }

    /*
     * Allocate a new page of fd and pin it.
     * The page is zeroed and marked dirty, so it reaches the file even
     * if nobody writes to it.
     */
    pub fn new_page(&self, fd: Fd) -> Result<PageGuard<'_>, PageFileError> {
        let (index, page_id) = {
            let mut state = lock(&self.state);
            let index = self.find_victim(&mut state)?;
            let page_id = PageId::new(fd, self.disk.allocate_page(fd));
            {
                let mut frame = lock(&self.frames[index]);
                frame.data.iter_mut().for_each(|b| *b = 0);
                frame.dirty = true;
            }
            state.metas[index].page_id = Some(page_id);
            state.metas[index].pin_count = 1;
            state.page_table.insert(page_id, index);
            debug!("New page {:?} in frame {}", page_id, index);
            (index, page_id)
        };
        Ok(self.guard(index, page_id))
    }

    fn unpin(&self, index: usize, page_id: PageId) {
        let mut state = lock(&self.state);
        let meta = &mut state.metas[index];
        if meta.page_id != Some(page_id) || meta.pin_count == 0 {
            error!("Unpin of page {:?} that is not pinned in frame {}", page_id, index);
            return;
        }
        meta.pin_count -= 1;
        if meta.pin_count == 0 {
            state.link(index);
        }
    }

    /*
     * Write a page back if it is in the buffer and dirty.
     * Returns false if the page is not in the buffer.
     * The page is pinned while state is held and latched after it is
     * released, so a thread holding the latch can still reach state.
     * Must not be called while this thread holds a guard on the page.
     */
    pub fn flush_page(&self, page_id: PageId) -> Result<bool, PageFileError> {
        let pin = {
            let mut state = lock(&self.state);
            let index = match state.page_table.get(&page_id) {
                Some(v) => *v,
                None => return Ok(false),
            };
            state.pin(index);
            Pin {
                pool: self,
                index,
                page_id,
            }
        };
        self.write_back(&pin)?;
        Ok(true)
    }

    fn write_back(&self, pin: &Pin<'_>) -> Result<(), PageFileError> {
        let mut frame = lock(&self.frames[pin.index]);
        if frame.dirty {
            self.disk.write_page(pin.page_id.fd, pin.page_id.page_no, &frame.data)?;
            frame.dirty = false;
        }
        Ok(())
    }

    fn pages_of(state: &PoolState, fd: Fd) -> Vec<(PageId, usize)> {
        let mut pages: Vec<(PageId, usize)> = state
            .page_table
            .iter()
            .filter(|(pid, _)| pid.fd == fd)
            .map(|(pid, i)| (*pid, *i))
            .collect();
        pages.sort_by_key(|(pid, _)| pid.page_no);
        pages
    }

    //write back every dirty page of fd, same locking as flush_page.
    pub fn flush_all_pages(&self, fd: Fd) -> Result<(), PageFileError> {
        let pins: Vec<Pin<'_>> = {
            let mut state = lock(&self.state);
            let pages = Self::pages_of(&state, fd);
            let pins = pages
                .into_iter()
                .map(|(page_id, index)| {
                    state.pin(index);
                    Pin {
                        pool: self,
                        index,
                        page_id,
                    }
                })
                .collect();
            pins
        };
        //pins left over after an error are released when the vec drops.
        for pin in pins.iter() {
            self.write_back(pin)?;
        }
        Ok(())
    }

    /*
     * Write back and drop every page of fd.
     * Needed before fd is closed: the OS may hand the same descriptor
     * number to another file, and its pages must not hit our stale
     * frames. Fails without touching anything if a page is pinned.
     * An unpinned frame has no latch holder, so latching it under state
     * never blocks.
     */
    pub fn remove_all_pages(&self, fd: Fd) -> Result<(), PageFileError> {
        let mut state = lock(&self.state);
        let pages = Self::pages_of(&state, fd);
        if let Some((page_id, _)) = pages.iter().find(|(_, i)| state.metas[*i].pin_count > 0) {
            return Err(PageFileError::PagePinned(*page_id));
        }
        for (page_id, index) in pages {
            {
                let mut frame = lock(&self.frames[index]);
                if frame.dirty {
                    self.disk.write_page(page_id.fd, page_id.page_no, &frame.data)?;
                    frame.dirty = false;
                }
            }
            state.unlink(index);
            state.forget(index);
        }
        debug!("Removed all pages of fd {} from buffer", fd);
        Ok(())
    }
}

struct Pin<'a> {
    pool: &'a BufferPoolManager,
    index: usize,
    page_id: PageId,
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        self.pool.unpin(self.index, self.page_id);
    }
}

/*
 * A pinned page.
 * Dropping the guard releases the latch and then the pin. Any mutable
 * access marks the page dirty, so a change cannot be lost by unpinning
 * it as clean.
 */
pub struct PageGuard<'a> {
    //dropped before pin: the latch goes first.
    frame: MutexGuard<'a, Frame>,
    pin: Pin<'a>,
}

impl PageGuard<'_> {
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    pub fn page_no(&self) -> PageNo {
        self.pin.page_id.page_no
    }

    pub fn data(&self) -> &[u8] {
        &self.frame.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.frame.dirty = true;
        &mut self.frame.data
    }

    pub fn mark_dirty(&mut self) {
        self.frame.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.frame.dirty
    }
}

impl std::fmt::Debug for PageGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageGuard")
            .field("page_id", &self.pin.page_id)
            .field("dirty", &self.frame.dirty)
            .finish()
    }
}
