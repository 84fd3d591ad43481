/**********************************************
  > File Name		: tests.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Oct 2026 10:15:30 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use super::buffer_manager::PageId;
use super::disk_manager::DiskManager;
use crate::config::PAGE_SIZE;
use crate::errors::PageFileError;
use crate::test_util::{init_logger, setup};

fn disk_manager() -> (tempfile::TempDir, DiskManager) {
    init_logger();
    let dir = tempfile::tempdir().expect("create temp dir failed");
    let disk = DiskManager::new(dir.path());
    (dir, disk)
}

#[test]
fn open_file_twice_returns_same_fd() {
    let (_dir, disk) = disk_manager();
    disk.create_file("t1").unwrap();
    let fd1 = disk.open_file("t1").unwrap();
    let fd2 = disk.open_file("t1").unwrap();
    assert_eq!(fd1, fd2);
    assert_eq!(disk.get_file_fd("t1").unwrap(), fd1);
    assert_eq!(disk.get_file_name(fd1).unwrap(), disk.root().join("t1"));
    disk.close_file(fd1).unwrap();
}

#[test]
fn file_lifecycle_misuse_is_reported() {
    let (_dir, disk) = disk_manager();
    disk.create_file("t1").unwrap();
    assert!(matches!(disk.create_file("t1"), Err(PageFileError::FileExists(_))));

    let fd = disk.open_file("t1").unwrap();
    assert!(matches!(disk.destroy_file("t1"), Err(PageFileError::FileNotClosed(_))));
    disk.close_file(fd).unwrap();
    assert!(matches!(disk.close_file(fd), Err(PageFileError::FileNotOpen(_))));
    assert!(matches!(disk.get_file_name(fd), Err(PageFileError::FileNotOpen(_))));

    disk.destroy_file("t1").unwrap();
    assert!(!disk.is_file("t1"));
    assert!(matches!(disk.destroy_file("t1"), Err(PageFileError::FileNotFound(_))));
    assert!(matches!(disk.open_file("t1"), Err(PageFileError::Io(_))));
}

#[test]
fn pages_are_placed_at_page_size_offsets() {
    let (_dir, disk) = disk_manager();
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    let data: Vec<u8> = (0..PAGE_SIZE).map(|i| (i % 251) as u8).collect();
    disk.write_page(fd, 3, &data).unwrap();
    assert_eq!(disk.get_file_size("t1"), Some(4 * PAGE_SIZE as u64));

    let mut buf = vec![0u8; PAGE_SIZE];
    disk.read_page(fd, 3, &mut buf).unwrap();
    assert_eq!(buf, data);

    //the hole before page 3 reads as zeros.
    disk.read_page(fd, 1, &mut buf).unwrap();
    assert!(buf.iter().all(|b| *b == 0));
    disk.close_file(fd).unwrap();
}

#[test]
fn read_past_end_of_file_is_short_read() {
    let (_dir, disk) = disk_manager();
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();
    disk.write_page(fd, 0, &[7u8; 100]).unwrap();

    let mut buf = vec![0u8; PAGE_SIZE];
    match disk.read_page(fd, 0, &mut buf) {
        Err(PageFileError::IncompleteRead { expected, actual }) => {
            assert_eq!(expected, PAGE_SIZE);
            assert_eq!(actual, 100);
        }
        other => panic!("unexpected result {:?}", other),
    }
    assert!(matches!(
        disk.read_page(fd, 9, &mut buf),
        Err(PageFileError::IncompleteRead { actual: 0, .. })
    ));
    assert!(matches!(disk.read_page(-1, 0, &mut buf), Err(PageFileError::FileNotOpen(_))));
}

#[test]
fn allocate_page_is_monotonic_per_fd() {
    let (_dir, disk) = disk_manager();
    disk.create_file("a").unwrap();
    disk.create_file("b").unwrap();
    let a = disk.open_file("a").unwrap();
    let b = disk.open_file("b").unwrap();

    assert_eq!(disk.allocate_page(a), 0);
    assert_eq!(disk.allocate_page(a), 1);
    assert_eq!(disk.allocate_page(b), 0);
    assert_eq!(disk.allocate_page(a), 2);
    disk.deallocate_page(1);
    assert_eq!(disk.allocate_page(a), 3);

    disk.set_next_page_no(b, 10);
    assert_eq!(disk.next_page_no(b), 10);
    assert_eq!(disk.allocate_page(b), 10);
    assert_eq!(disk.allocate_page(b), 11);
}

#[test]
fn get_file_size_of_missing_file_is_none() {
    let (_dir, disk) = disk_manager();
    assert_eq!(disk.get_file_size("nothing"), None);
    disk.create_file("empty").unwrap();
    assert_eq!(disk.get_file_size("empty"), Some(0));
}

#[test]
fn directories_can_be_created_and_destroyed() {
    let (_dir, disk) = disk_manager();
    assert!(!disk.is_dir("db"));
    disk.create_dir("db").unwrap();
    assert!(disk.is_dir("db"));
    disk.create_file("db/t1").unwrap();
    assert!(matches!(disk.create_dir("db"), Err(PageFileError::Io(_))));
    disk.destroy_dir("db").unwrap();
    assert!(!disk.is_dir("db"));
    assert!(!disk.is_file("db/t1"));
}

#[test]
fn log_reads_back_what_was_appended() {
    let (_dir, disk) = disk_manager();
    disk.write_log(b"hello ").unwrap();
    let offset = disk.get_file_size(crate::config::LOG_FILE_NAME).unwrap();
    assert_eq!(offset, 6);
    disk.write_log(b"world").unwrap();

    let mut buf = [0u8; 5];
    assert_eq!(disk.read_log(&mut buf, offset).unwrap(), 5);
    assert_eq!(&buf, b"world");

    //reads are clamped to the end of the log.
    let mut big = [0u8; 64];
    assert_eq!(disk.read_log(&mut big, 0).unwrap(), 11);
    assert_eq!(&big[..11], b"hello world");

    assert_eq!(disk.read_log(&mut big, 11).unwrap(), 0);
    assert!(matches!(
        disk.read_log(&mut big, 12),
        Err(PageFileError::LogOffsetOutOfRange { offset: 12, size: 11 })
    ));
}

#[test]
fn new_page_is_pinned_until_guard_drops() {
    let (_dir, disk, pool) = setup(4);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    let page_id = {
        let mut page = pool.new_page(fd).unwrap();
        assert_eq!(page.page_no(), 0);
        assert!(page.data().iter().all(|b| *b == 0));
        page.data_mut()[0] = 42;
        assert_eq!(pool.pin_count(page.page_id()), Some(1));
        page.page_id()
    };
    assert_eq!(pool.pin_count(page_id), Some(0));

    assert!(pool.flush_page(page_id).unwrap());
    let mut buf = vec![0u8; PAGE_SIZE];
    disk.read_page(fd, 0, &mut buf).unwrap();
    assert_eq!(buf[0], 42);

    let page = pool.fetch_page(page_id).unwrap();
    assert_eq!(page.data()[0], 42);
    assert!(!page.is_dirty());
}

#[test]
fn evicted_dirty_page_is_written_back() {
    let (_dir, disk, pool) = setup(2);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    for i in 0..3u8 {
        let mut page = pool.new_page(fd).unwrap();
        page.data_mut()[10] = i + 1;
    }
    //page 0 was the least recently unpinned one.
    assert_eq!(pool.pin_count(PageId::new(fd, 0)), None);
    assert_eq!(pool.num_resident_pages(), 2);

    let mut buf = vec![0u8; PAGE_SIZE];
    disk.read_page(fd, 0, &mut buf).unwrap();
    assert_eq!(buf[10], 1);

    let page = pool.fetch_page(PageId::new(fd, 0)).unwrap();
    assert_eq!(page.data()[10], 1);
}

#[test]
fn least_recently_unpinned_page_is_the_victim() {
    let (_dir, disk, pool) = setup(2);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    drop(pool.new_page(fd).unwrap());
    drop(pool.new_page(fd).unwrap());
    //touch page 0, page 1 becomes the oldest.
    drop(pool.fetch_page(PageId::new(fd, 0)).unwrap());
    drop(pool.new_page(fd).unwrap());

    assert_eq!(pool.pin_count(PageId::new(fd, 0)), Some(0));
    assert_eq!(pool.pin_count(PageId::new(fd, 1)), None);
    assert_eq!(pool.pin_count(PageId::new(fd, 2)), Some(0));
}

#[test]
fn all_pinned_pool_refuses_new_pages() {
    let (_dir, disk, pool) = setup(1);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    let page = pool.new_page(fd).unwrap();
    assert!(matches!(pool.new_page(fd), Err(PageFileError::AllPagesPinned)));
    assert!(matches!(
        pool.fetch_page(PageId::new(fd, 7)),
        Err(PageFileError::AllPagesPinned)
    ));
    drop(page);
    assert!(pool.new_page(fd).is_ok());
}

#[test]
fn failed_read_gives_the_frame_back() {
    let (_dir, disk, pool) = setup(1);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    assert!(matches!(
        pool.fetch_page(PageId::new(fd, 5)),
        Err(PageFileError::IncompleteRead { .. })
    ));
    assert_eq!(pool.num_resident_pages(), 0);
    assert!(pool.new_page(fd).is_ok());
}

#[test]
fn remove_all_pages_refuses_pinned_pages() {
    let (_dir, disk, pool) = setup(4);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    drop(pool.new_page(fd).unwrap());
    let mut page = pool.new_page(fd).unwrap();
    page.data_mut()[0] = 9;
    assert!(matches!(pool.remove_all_pages(fd), Err(PageFileError::PagePinned(_))));
    assert_eq!(pool.num_resident_pages(), 2);
    drop(page);

    pool.remove_all_pages(fd).unwrap();
    assert_eq!(pool.num_resident_pages(), 0);
    let mut buf = vec![0u8; PAGE_SIZE];
    disk.read_page(fd, 1, &mut buf).unwrap();
    assert_eq!(buf[0], 9);
}

#[test]
fn flush_all_pages_only_touches_one_file() {
    let (_dir, disk, pool) = setup(4);
    disk.create_file("a").unwrap();
    disk.create_file("b").unwrap();
    let a = disk.open_file("a").unwrap();
    let b = disk.open_file("b").unwrap();

    pool.new_page(a).unwrap().data_mut()[0] = 1;
    pool.new_page(b).unwrap().data_mut()[0] = 2;
    pool.flush_all_pages(a).unwrap();

    assert_eq!(disk.get_file_size("a"), Some(PAGE_SIZE as u64));
    assert_eq!(disk.get_file_size("b"), Some(0));
    assert!(!pool.flush_page(PageId::new(b, 3)).unwrap());
}

#[test]
fn flush_waiting_on_a_latch_does_not_block_the_pool() {
    let (_dir, disk, pool) = setup(4);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    let page_id = {
        let mut page = pool.new_page(fd).unwrap();
        page.data_mut()[0] = 5;
        page.page_id()
    };
    let page = pool.fetch_page(page_id).unwrap();

    std::thread::scope(|s| {
        let flusher = s.spawn(|| pool.flush_page(page_id).unwrap());
        std::thread::sleep(std::time::Duration::from_millis(50));
        //the latch holder can still get other pages while the flush waits.
        drop(pool.new_page(fd).unwrap());
        drop(page);
        assert!(flusher.join().unwrap());
    });

    assert_eq!(pool.pin_count(page_id), Some(0));
    let mut buf = vec![0u8; PAGE_SIZE];
    disk.read_page(fd, 0, &mut buf).unwrap();
    assert_eq!(buf[0], 5);
}

#[test]
fn page_io_works_from_several_threads() {
    let (_dir, disk, _pool) = setup(1);
    disk.create_file("t1").unwrap();
    let fd = disk.open_file("t1").unwrap();

    std::thread::scope(|s| {
        for t in 0..4u32 {
            let disk = &disk;
            s.spawn(move || {
                let data = vec![t as u8 + 1; PAGE_SIZE];
                for round in 0..16 {
                    disk.write_page(fd, t + 4 * round, &data).unwrap();
                }
            });
        }
    });

    let mut buf = vec![0u8; PAGE_SIZE];
    for page_no in 0..64u32 {
        disk.read_page(fd, page_no, &mut buf).unwrap();
        assert!(buf.iter().all(|b| *b == (page_no % 4) as u8 + 1), "page {}", page_no);
    }
    disk.close_file(fd).unwrap();
}
