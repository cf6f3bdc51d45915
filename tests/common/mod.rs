//! Common test utilities for integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use tempfile::TempDir;
use todo_mcp::{FolderService, Storage, TodoServerHandler, TodoService};

/// Wednesday 2025-01-15 12:00, the clock every test runs at
pub fn fixed_now() -> NaiveDateTime {
    at(2025, 1, 15, 12, 0)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

pub fn data_file(dir: &TempDir) -> PathBuf {
    dir.path().join("data").join("todos.json")
}

/// Create a test service with temporary storage and folders
pub fn get_test_service(dir: &TempDir) -> TodoService {
    let storage = Storage::new(data_file(dir), 3, false);
    let folders = FolderService::new(dir.path().join("todo_folders"));
    TodoService::new(storage, folders).with_clock(fixed_now)
}

/// Create a test handler with temporary storage
pub fn get_test_handler() -> (TodoServerHandler, TempDir) {
    let dir = TempDir::new().unwrap();
    let handler = TodoServerHandler::from_service(get_test_service(&dir));
    (handler, dir)
}

/// Extract the id from "... created with ID: <id> ..." responses
pub fn extract_id_from_response(response: &str) -> u32 {
    let start = response.find("ID: ").expect("response has no ID") + 4;
    response[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap()
}

/// Write a data file by hand
pub fn write_data_file(dir: &TempDir, json: &str) -> PathBuf {
    let path = data_file(dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}
